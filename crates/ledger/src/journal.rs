//! Journal engine: the only writer of account balances.
//!
//! ```text
//! NewJournalEntry
//!   ↓
//! 1. Validate (line count, amounts, metadata, debits == credits); no store access
//!   ↓
//! 2. Open a session bound to the tenant
//!   ↓
//! 3. Resolve every referenced account inside that session, ascending id
//!   ↓
//! 4. Insert header + lines
//!   ↓
//! 5. Apply per-account balance deltas, ascending account id
//!   ↓
//! 6. Commit
//! ```
//!
//! A failure anywhere before step 6 drops the session, which rolls back every
//! write of the unit of work.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use tally_accounting::{JournalEntry, NewJournalEntry};
use tally_core::{JournalEntryId, LedgerError, LedgerResult, OperationContext, Page, PageRequest, TenantId};
use tally_infra::{JournalFilter, LedgerStore, ScopedSession};

use crate::deadline::before_deadline;

#[derive(Debug)]
pub struct JournalEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for JournalEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> JournalEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record a balanced journal entry and update balances in one unit of work.
    ///
    /// - `InvalidInput`: fewer than two lines, a malformed or negative amount,
    ///   metadata that is not a JSON object
    /// - `FailedPrecondition`: debits and credits differ
    /// - `NotFound`: a line's account does not exist in this tenant
    /// - `Unavailable`: no session before the deadline / acquire timeout
    #[instrument(
        skip(self, ctx, params),
        fields(
            tenant_id = %tenant_id,
            reference_number = %params.reference_number,
            line_count = params.lines.len()
        ),
        err
    )]
    pub async fn create_journal_entry(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        params: NewJournalEntry,
    ) -> LedgerResult<JournalEntry> {
        let validated = params.validate().map_err(|e| {
            warn!(error = %e, "journal entry rejected");
            LedgerError::from(e)
        })?;
        let total = validated.total();

        let (session, entry) = before_deadline(ctx, async {
            let mut session = self.store.scope(tenant_id, ctx).await?;

            for account_id in validated.account_ids() {
                if session.find_account(account_id).await?.is_none() {
                    let line = validated
                        .lines()
                        .iter()
                        .position(|l| l.account_id == account_id)
                        .unwrap_or_default();
                    return Err(LedgerError::not_found(format!(
                        "account {account_id} at line {line}"
                    )));
                }
            }

            let now = Utc::now();
            let deltas = validated.balance_deltas();
            let entry = validated.into_entry(tenant_id, now);
            session.insert_journal_entry(&entry).await?;

            for delta in &deltas {
                let updated = session.apply_balance_delta(delta, now).await?;
                if updated.is_none() {
                    return Err(LedgerError::internal(format!(
                        "no balance row for account {}",
                        delta.account_id
                    )));
                }
                debug!(account_id = %delta.account_id, debit = %delta.debit, credit = %delta.credit, "balance updated");
            }

            Ok((session, entry))
        })
        .await?;

        // Past this point the deadline no longer applies.
        session.commit().await?;
        info!(entry_id = %entry.id, total = %total, "journal entry committed");
        Ok(entry)
    }

    /// Entry with its lines in creation order.
    #[instrument(skip(self, ctx), fields(tenant_id = %tenant_id), err)]
    pub async fn get_journal_entry(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        entry_id: JournalEntryId,
    ) -> LedgerResult<JournalEntry> {
        before_deadline(ctx, async {
            let mut session = self.store.scope(tenant_id, ctx).await?;
            session.journal_entry(entry_id).await
        })
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("journal entry {entry_id}")))
    }

    /// Entry date descending, then creation time descending.
    #[instrument(skip(self, ctx), fields(tenant_id = %tenant_id), err)]
    pub async fn list_journal_entries(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        filter: JournalFilter,
        page: PageRequest,
    ) -> LedgerResult<Page<JournalEntry>> {
        let pagination = page.clamp();
        before_deadline(ctx, async {
            let mut session = self.store.scope(tenant_id, ctx).await?;
            session.list_journal_entries(&filter, pagination).await
        })
        .await
    }
}
