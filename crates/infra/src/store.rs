//! Store contract for the ledger.
//!
//! [`LedgerStore`] holds the global data (tenants, reference catalogues) and
//! is the only way to obtain a [`ScopedSession`]. A session is one unit of work
//! bound to exactly one tenant: every account, balance and journal read or
//! write it performs is filtered by that tenant.
//!
//! ## Session lifecycle
//!
//! - `scope()` acquires an exclusive resource from a bounded pool and binds the
//!   tenant. It fails with `Unavailable` when the pool stays exhausted past the
//!   acquire timeout or the caller's deadline, `NotFound` for an unknown tenant
//!   and `Internal` when the tenant binding cannot be established.
//! - `commit()` consumes the session and makes its writes durable.
//! - Dropping a session without committing rolls it back and returns the
//!   resource to the pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_accounting::{Account, AccountBalance, AccountType, BalanceDelta, Currency, JournalEntry, Tenant};
use tally_core::{
    AccountId, JournalEntryId, LedgerResult, OperationContext, Page, Pagination, TenantId,
};

/// Conjunctive filter for account listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFilter {
    pub account_type_id: Option<i32>,
    pub currency_code: Option<String>,
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        self.account_type_id
            .is_none_or(|t| account.account_type_id == t)
            && self
                .currency_code
                .as_deref()
                .is_none_or(|c| account.currency_code == c)
    }
}

/// Conjunctive filter for journal listings. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalFilter {
    /// Entries with at least one line on this account.
    pub account_id: Option<AccountId>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

impl JournalFilter {
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        self.account_id.is_none_or(|a| entry.touches(a))
            && self.from_date.is_none_or(|from| entry.entry_date >= from)
            && self.to_date.is_none_or(|to| entry.entry_date <= to)
    }
}

/// Global side of the store plus the tenant access gate.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Session: ScopedSession;

    async fn insert_tenant(&self, tenant: &Tenant) -> LedgerResult<()>;

    async fn tenant_by_id(&self, id: TenantId) -> LedgerResult<Option<Tenant>>;

    /// Earliest created tenant with exactly this name.
    async fn tenant_by_name(&self, name: &str) -> LedgerResult<Option<Tenant>>;

    /// Ordered by id.
    async fn list_account_types(&self) -> LedgerResult<Vec<AccountType>>;

    /// Ordered by code.
    async fn list_currencies(&self) -> LedgerResult<Vec<Currency>>;

    /// Open a unit of work bound to `tenant_id`.
    async fn scope(&self, tenant_id: TenantId, ctx: &OperationContext) -> LedgerResult<Self::Session>;
}

/// One tenant-bound unit of work. See the module docs for the lifecycle.
#[async_trait]
pub trait ScopedSession: Send + Sized {
    async fn account_type_exists(&mut self, account_type_id: i32) -> LedgerResult<bool>;

    async fn currency_exists(&mut self, code: &str) -> LedgerResult<bool>;

    async fn find_account(&mut self, id: AccountId) -> LedgerResult<Option<Account>>;

    async fn account_number_exists(&mut self, account_number: &str) -> LedgerResult<bool>;

    /// Insert an account together with its zero balance.
    async fn insert_account(&mut self, account: &Account, balance: &AccountBalance) -> LedgerResult<()>;

    /// Newest first.
    async fn list_accounts(
        &mut self,
        filter: &AccountFilter,
        pagination: Pagination,
    ) -> LedgerResult<Page<Account>>;

    async fn balance(&mut self, account_id: AccountId) -> LedgerResult<Option<AccountBalance>>;

    /// Atomically add `delta` to the account's running balance.
    ///
    /// Returns the updated balance, or `None` when the account has no balance
    /// row in this tenant. A balance that would leave the decimal range fails
    /// with `FailedPrecondition` and is left unchanged.
    async fn apply_balance_delta(
        &mut self,
        delta: &BalanceDelta,
        now: DateTime<Utc>,
    ) -> LedgerResult<Option<AccountBalance>>;

    /// Insert the header and every line.
    async fn insert_journal_entry(&mut self, entry: &JournalEntry) -> LedgerResult<()>;

    /// Entry with its lines in creation order.
    async fn journal_entry(&mut self, id: JournalEntryId) -> LedgerResult<Option<JournalEntry>>;

    /// Ordered by entry date, then creation time, both descending.
    async fn list_journal_entries(
        &mut self,
        filter: &JournalFilter,
        pagination: Pagination,
    ) -> LedgerResult<Page<JournalEntry>>;

    async fn commit(self) -> LedgerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_accounting::{NewAccount, NewJournalEntry, NewJournalLine};

    fn account(type_id: i32, currency: &str) -> Account {
        Account::open(
            TenantId::new(),
            NewAccount::new("1000", "Cash", type_id, currency),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn account_filter_is_conjunctive() {
        let usd_asset = account(1, "USD");

        assert!(AccountFilter::default().matches(&usd_asset));
        assert!(
            AccountFilter {
                account_type_id: Some(1),
                currency_code: Some("USD".into()),
            }
            .matches(&usd_asset)
        );
        assert!(
            !AccountFilter {
                account_type_id: Some(1),
                currency_code: Some("EUR".into()),
            }
            .matches(&usd_asset)
        );
        assert!(
            !AccountFilter {
                account_type_id: Some(4),
                currency_code: None,
            }
            .matches(&usd_asset)
        );
    }

    #[test]
    fn journal_filter_date_bounds_are_inclusive() {
        let cash = AccountId::new();
        let date = Utc::now();
        let entry = NewJournalEntry::new(
            "JE-1",
            "",
            date,
            vec![
                NewJournalLine::debit(cash, "5"),
                NewJournalLine::credit(AccountId::new(), "5"),
            ],
        )
        .validate()
        .unwrap()
        .into_entry(TenantId::new(), Utc::now());

        let exact = JournalFilter {
            account_id: Some(cash),
            from_date: Some(date),
            to_date: Some(date),
        };
        assert!(exact.matches(&entry));

        let later = JournalFilter {
            from_date: Some(date + chrono::Duration::seconds(1)),
            ..JournalFilter::default()
        };
        assert!(!later.matches(&entry));

        let other_account = JournalFilter {
            account_id: Some(AccountId::new()),
            ..JournalFilter::default()
        };
        assert!(!other_account.matches(&entry));
    }
}
