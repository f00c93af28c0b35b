//! In-memory ledger store.
//!
//! Intended for tests/dev. Each tenant owns a partition behind an async mutex;
//! a session holds that mutex for its whole lifetime, writes in place and
//! undoes its writes if dropped before `commit()`. Sessions are drawn from a
//! semaphore sized by [`StoreConfig::max_sessions`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::{debug, instrument};

use tally_accounting::reference::{builtin_account_types, builtin_currencies};
use tally_accounting::{Account, AccountBalance, AccountType, BalanceDelta, Currency, JournalEntry, Tenant};
use tally_core::{
    AccountId, JournalEntryId, LedgerError, LedgerResult, OperationContext, Page, Pagination,
    TenantId,
};

use crate::config::StoreConfig;
use crate::store::{AccountFilter, JournalFilter, LedgerStore, ScopedSession};

#[derive(Debug, Default)]
struct TenantPartition {
    /// Insertion order.
    accounts: Vec<Account>,
    balances: HashMap<AccountId, AccountBalance>,
    /// Insertion order.
    entries: Vec<JournalEntry>,
}

#[derive(Debug)]
pub struct InMemoryLedgerStore {
    config: StoreConfig,
    permits: Arc<Semaphore>,
    /// Insertion order, which is also creation order.
    tenants: RwLock<Vec<Tenant>>,
    partitions: RwLock<HashMap<TenantId, Arc<Mutex<TenantPartition>>>>,
    account_types: Vec<AccountType>,
    currencies: Vec<Currency>,
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl InMemoryLedgerStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.max_sessions)),
            config,
            tenants: RwLock::new(Vec::new()),
            partitions: RwLock::new(HashMap::new()),
            account_types: builtin_account_types(),
            currencies: builtin_currencies(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Sessions that could be opened right now without waiting.
    pub fn available_sessions(&self) -> usize {
        self.permits.available_permits()
    }

    fn partition(&self, tenant_id: TenantId) -> LedgerResult<Option<Arc<Mutex<TenantPartition>>>> {
        let partitions = self
            .partitions
            .read()
            .map_err(|_| LedgerError::internal("partition lock poisoned"))?;
        Ok(partitions.get(&tenant_id).cloned())
    }
}

fn poisoned() -> LedgerError {
    LedgerError::internal("tenant lock poisoned")
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    type Session = InMemorySession;

    async fn insert_tenant(&self, tenant: &Tenant) -> LedgerResult<()> {
        let mut tenants = self.tenants.write().map_err(|_| poisoned())?;
        let mut partitions = self
            .partitions
            .write()
            .map_err(|_| LedgerError::internal("partition lock poisoned"))?;

        if partitions.contains_key(&tenant.id) {
            return Err(LedgerError::internal(format!(
                "tenant {} already exists",
                tenant.id
            )));
        }
        partitions.insert(tenant.id, Arc::new(Mutex::new(TenantPartition::default())));
        tenants.push(tenant.clone());
        Ok(())
    }

    async fn tenant_by_id(&self, id: TenantId) -> LedgerResult<Option<Tenant>> {
        let tenants = self.tenants.read().map_err(|_| poisoned())?;
        Ok(tenants.iter().find(|t| t.id == id).cloned())
    }

    async fn tenant_by_name(&self, name: &str) -> LedgerResult<Option<Tenant>> {
        let tenants = self.tenants.read().map_err(|_| poisoned())?;
        Ok(tenants.iter().find(|t| t.name == name).cloned())
    }

    async fn list_account_types(&self) -> LedgerResult<Vec<AccountType>> {
        Ok(self.account_types.clone())
    }

    async fn list_currencies(&self) -> LedgerResult<Vec<Currency>> {
        Ok(self.currencies.clone())
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %tenant_id), err)]
    async fn scope(&self, tenant_id: TenantId, ctx: &OperationContext) -> LedgerResult<InMemorySession> {
        if ctx.is_expired() {
            return Err(LedgerError::unavailable("deadline exceeded"));
        }

        let wait = ctx.bound(self.config.acquire_timeout());
        let permit = match timeout(wait, self.permits.clone().acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(LedgerError::unavailable("session pool closed")),
            Err(_) => {
                return Err(LedgerError::unavailable(format!(
                    "no session available within {}ms",
                    wait.as_millis()
                )));
            }
        };

        let partition = self
            .partition(tenant_id)?
            .ok_or_else(|| LedgerError::not_found(format!("tenant {tenant_id}")))?;

        // Same-tenant sessions are serialised on the partition.
        let wait = ctx.bound(self.config.acquire_timeout());
        let guard = timeout(wait, partition.lock_owned())
            .await
            .map_err(|_| LedgerError::unavailable("timed out waiting for tenant partition"))?;

        debug!("session opened");
        Ok(InMemorySession {
            tenant_id,
            guard,
            undo: Vec::new(),
            _permit: permit,
        })
    }
}

/// Inverse of one write made through a session.
#[derive(Debug)]
enum Undo {
    AccountInserted(AccountId),
    BalanceChanged(AccountBalance),
    EntryInserted,
}

/// Tenant-bound unit of work over an [`InMemoryLedgerStore`].
///
/// Writes go straight into the locked partition and are recorded in an undo
/// log. Dropping the session without committing replays the log backwards.
#[derive(Debug)]
pub struct InMemorySession {
    tenant_id: TenantId,
    guard: OwnedMutexGuard<TenantPartition>,
    undo: Vec<Undo>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        if self.undo.is_empty() {
            return;
        }
        debug!(writes = self.undo.len(), "session rolled back");
        let partition = &mut *self.guard;
        while let Some(op) = self.undo.pop() {
            match op {
                Undo::AccountInserted(id) => {
                    partition.accounts.retain(|a| a.id != id);
                    partition.balances.remove(&id);
                }
                Undo::BalanceChanged(previous) => {
                    partition.balances.insert(previous.account_id, previous);
                }
                Undo::EntryInserted => {
                    partition.entries.pop();
                }
            }
        }
    }
}

#[async_trait]
impl ScopedSession for InMemorySession {
    async fn account_type_exists(&mut self, account_type_id: i32) -> LedgerResult<bool> {
        Ok(builtin_account_types()
            .iter()
            .any(|t| t.id == account_type_id))
    }

    async fn currency_exists(&mut self, code: &str) -> LedgerResult<bool> {
        Ok(builtin_currencies().iter().any(|c| c.code == code))
    }

    async fn find_account(&mut self, id: AccountId) -> LedgerResult<Option<Account>> {
        Ok(self.guard.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn account_number_exists(&mut self, account_number: &str) -> LedgerResult<bool> {
        Ok(self
            .guard
            .accounts
            .iter()
            .any(|a| a.account_number == account_number))
    }

    async fn insert_account(&mut self, account: &Account, balance: &AccountBalance) -> LedgerResult<()> {
        if account.tenant_id != self.tenant_id {
            return Err(LedgerError::internal("account belongs to another tenant"));
        }
        if self
            .guard
            .accounts
            .iter()
            .any(|a| a.account_number == account.account_number)
        {
            return Err(LedgerError::failed_precondition(format!(
                "account number {} already exists",
                account.account_number
            )));
        }

        self.guard.accounts.push(account.clone());
        self.guard.balances.insert(account.id, balance.clone());
        self.undo.push(Undo::AccountInserted(account.id));
        Ok(())
    }

    async fn list_accounts(
        &mut self,
        filter: &AccountFilter,
        pagination: Pagination,
    ) -> LedgerResult<Page<Account>> {
        let mut matched: Vec<&Account> = self
            .guard
            .accounts
            .iter()
            .filter(|a| filter.matches(a))
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matched.len() as u64;
        let items = pagination.apply(&matched).into_iter().cloned().collect();
        Ok(Page::new(items, total))
    }

    async fn balance(&mut self, account_id: AccountId) -> LedgerResult<Option<AccountBalance>> {
        Ok(self.guard.balances.get(&account_id).cloned())
    }

    async fn apply_balance_delta(
        &mut self,
        delta: &BalanceDelta,
        now: DateTime<Utc>,
    ) -> LedgerResult<Option<AccountBalance>> {
        let Some(balance) = self.guard.balances.get_mut(&delta.account_id) else {
            return Ok(None);
        };

        let previous = balance.clone();
        balance.apply(delta, now)?;
        let updated = balance.clone();
        self.undo.push(Undo::BalanceChanged(previous));
        Ok(Some(updated))
    }

    async fn insert_journal_entry(&mut self, entry: &JournalEntry) -> LedgerResult<()> {
        if entry.tenant_id != self.tenant_id {
            return Err(LedgerError::internal("journal entry belongs to another tenant"));
        }
        self.guard.entries.push(entry.clone());
        self.undo.push(Undo::EntryInserted);
        Ok(())
    }

    async fn journal_entry(&mut self, id: JournalEntryId) -> LedgerResult<Option<JournalEntry>> {
        Ok(self.guard.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn list_journal_entries(
        &mut self,
        filter: &JournalFilter,
        pagination: Pagination,
    ) -> LedgerResult<Page<JournalEntry>> {
        let mut matched: Vec<&JournalEntry> = self
            .guard
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .collect();
        matched.sort_by(|a, b| {
            b.entry_date
                .cmp(&a.entry_date)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });

        let total = matched.len() as u64;
        let items = pagination.apply(&matched).into_iter().cloned().collect();
        Ok(Page::new(items, total))
    }

    async fn commit(mut self) -> LedgerResult<()> {
        self.undo.clear();
        debug!("session committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rust_decimal::Decimal;
    use tally_accounting::{NewAccount, NewJournalEntry, NewJournalLine};

    fn store(max_sessions: usize) -> InMemoryLedgerStore {
        InMemoryLedgerStore::new(StoreConfig {
            max_sessions,
            acquire_timeout_ms: 50,
        })
    }

    async fn tenant(store: &InMemoryLedgerStore, name: &str) -> Tenant {
        let t = Tenant::new(name, Utc::now()).unwrap();
        store.insert_tenant(&t).await.unwrap();
        t
    }

    fn cash(tenant_id: TenantId) -> (Account, AccountBalance) {
        let now = Utc::now();
        let a = Account::open(tenant_id, NewAccount::new("1000", "Cash", 1, "USD"), now).unwrap();
        let b = AccountBalance::zero(a.id, now);
        (a, b)
    }

    #[tokio::test]
    async fn committed_writes_are_visible_to_later_sessions() {
        let store = store(2);
        let t = tenant(&store, "Acme").await;
        let ctx = OperationContext::background();

        let mut s = store.scope(t.id, &ctx).await.unwrap();
        let (account, balance) = cash(t.id);
        s.insert_account(&account, &balance).await.unwrap();
        s.commit().await.unwrap();

        let mut s = store.scope(t.id, &ctx).await.unwrap();
        assert!(s.find_account(account.id).await.unwrap().is_some());
        assert!(s.balance(account.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn dropped_session_rolls_back() {
        let store = store(2);
        let t = tenant(&store, "Acme").await;
        let ctx = OperationContext::background();

        let (account, balance) = cash(t.id);
        {
            let mut s = store.scope(t.id, &ctx).await.unwrap();
            s.insert_account(&account, &balance).await.unwrap();
        }

        let mut s = store.scope(t.id, &ctx).await.unwrap();
        assert!(s.find_account(account.id).await.unwrap().is_none());
        assert_eq!(store.available_sessions(), 1);
    }

    #[tokio::test]
    async fn dropped_session_restores_balances_and_entries() {
        let store = store(2);
        let t = tenant(&store, "Acme").await;
        let ctx = OperationContext::background();

        let (account, balance) = cash(t.id);
        let mut s = store.scope(t.id, &ctx).await.unwrap();
        s.insert_account(&account, &balance).await.unwrap();
        s.commit().await.unwrap();

        let entry = NewJournalEntry::new(
            "JE-1",
            "",
            Utc::now(),
            vec![
                NewJournalLine::debit(account.id, "7"),
                NewJournalLine::credit(account.id, "7"),
            ],
        )
        .validate()
        .unwrap();
        let deltas = entry.balance_deltas();
        let entry = entry.into_entry(t.id, Utc::now());
        {
            let mut s = store.scope(t.id, &ctx).await.unwrap();
            s.insert_journal_entry(&entry).await.unwrap();
            for d in &deltas {
                s.apply_balance_delta(d, Utc::now()).await.unwrap();
            }
            assert_eq!(
                s.balance(account.id).await.unwrap().unwrap().debit_balance,
                Decimal::from(7)
            );
        }

        let mut s = store.scope(t.id, &ctx).await.unwrap();
        assert!(s.journal_entry(entry.id).await.unwrap().is_none());
        assert_eq!(s.balance(account.id).await.unwrap(), Some(balance));
    }

    #[tokio::test]
    async fn overflowing_delta_fails_and_keeps_balance() {
        let store = store(1);
        let t = tenant(&store, "Acme").await;
        let mut s = store.scope(t.id, &OperationContext::background()).await.unwrap();
        let (account, balance) = cash(t.id);
        s.insert_account(&account, &balance).await.unwrap();

        let delta = BalanceDelta {
            account_id: account.id,
            debit: Decimal::MAX,
            credit: Decimal::ZERO,
        };
        s.apply_balance_delta(&delta, Utc::now()).await.unwrap();
        let err = s.apply_balance_delta(&delta, Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), tally_core::ErrorKind::FailedPrecondition);
        assert_eq!(
            s.balance(account.id).await.unwrap().unwrap().debit_balance,
            Decimal::MAX
        );
    }

    #[tokio::test]
    async fn exhausted_pool_is_unavailable() {
        let store = store(1);
        let a = tenant(&store, "A").await;
        let b = tenant(&store, "B").await;
        let ctx = OperationContext::background();

        let _held = store.scope(a.id, &ctx).await.unwrap();
        let err = store.scope(b.id, &ctx).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn unknown_tenant_is_not_found() {
        let store = store(1);
        let err = store
            .scope(TenantId::new(), &OperationContext::background())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), tally_core::ErrorKind::NotFound);
        // permit went back to the pool
        assert_eq!(store.available_sessions(), 1);
    }

    #[tokio::test]
    async fn expired_deadline_is_unavailable() {
        let store = store(1);
        let t = tenant(&store, "Acme").await;
        let ctx = OperationContext::with_timeout(Duration::ZERO);
        let err = store.scope(t.id, &ctx).await.unwrap_err();
        assert_eq!(err.message(), "deadline exceeded");
    }

    #[tokio::test]
    async fn duplicate_account_number_is_rejected() {
        let store = store(1);
        let t = tenant(&store, "Acme").await;
        let mut s = store.scope(t.id, &OperationContext::background()).await.unwrap();

        let (a1, b1) = cash(t.id);
        let (a2, b2) = cash(t.id);
        s.insert_account(&a1, &b1).await.unwrap();
        let err = s.insert_account(&a2, &b2).await.unwrap_err();
        assert_eq!(err.kind(), tally_core::ErrorKind::FailedPrecondition);
    }

    #[tokio::test]
    async fn tenant_by_name_returns_earliest() {
        let store = store(1);
        let first = tenant(&store, "Twin").await;
        let _second = tenant(&store, "Twin").await;
        let found = store.tenant_by_name("Twin").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(store.tenant_by_name("twin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn balance_delta_on_missing_account_returns_none() {
        let store = store(1);
        let t = tenant(&store, "Acme").await;
        let mut s = store.scope(t.id, &OperationContext::background()).await.unwrap();
        let delta = BalanceDelta {
            account_id: AccountId::new(),
            debit: Decimal::ONE,
            credit: Decimal::ZERO,
        };
        assert!(s.apply_balance_delta(&delta, Utc::now()).await.unwrap().is_none());
    }
}
