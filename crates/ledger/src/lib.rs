//! `tally-ledger`: multi-tenant double-entry ledger engine.
//!
//! [`Ledger`] is the caller-facing surface. It owns a [`LedgerStore`] and
//! routes every operation through the component responsible for it:
//!
//! - [`TenantDirectory`]: tenant identities
//! - [`ChartOfAccounts`]: accounts and balance reads
//! - [`JournalEngine`]: balanced entries, the only balance writer
//! - [`ReferenceData`]: account types and currencies
//!
//! Every operation takes an [`OperationContext`]; its deadline bounds session
//! acquisition and all work up to commit.

mod deadline;

pub mod chart;
pub mod directory;
pub mod journal;
pub mod reference;

use std::sync::Arc;

pub use chart::ChartOfAccounts;
pub use directory::TenantDirectory;
pub use journal::JournalEngine;
pub use reference::ReferenceData;

pub use tally_accounting::{
    Account, AccountBalance, AccountType, Currency, JournalEntry, JournalEntryLine, NewAccount,
    NewJournalEntry, NewJournalLine, NormalBalance, Tenant,
};
pub use tally_core::{
    AccountId, ErrorKind, JournalEntryId, LedgerError, LedgerResult, OperationContext, Page,
    PageRequest, TenantId,
};
pub use tally_infra::{
    AccountFilter, InMemoryLedgerStore, JournalFilter, LedgerConfig, LedgerStore,
    PostgresLedgerStore, StoreConfig,
};

pub struct Ledger<S> {
    store: Arc<S>,
    directory: TenantDirectory<S>,
    chart: ChartOfAccounts<S>,
    journal: JournalEngine<S>,
    reference: ReferenceData<S>,
}

impl<S> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            directory: self.directory.clone(),
            chart: self.chart.clone(),
            journal: self.journal.clone(),
            reference: self.reference.clone(),
        }
    }
}

impl Ledger<InMemoryLedgerStore> {
    pub fn in_memory(config: StoreConfig) -> Self {
        Self::new(InMemoryLedgerStore::new(config))
    }
}

impl Ledger<PostgresLedgerStore> {
    /// Connect to Postgres and apply the schema.
    pub async fn connect(config: &LedgerConfig) -> LedgerResult<Self> {
        let store = PostgresLedgerStore::connect(&config.database).await?;
        store.migrate().await?;
        Ok(Self::new(store))
    }
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    pub fn from_arc(store: Arc<S>) -> Self {
        Self {
            directory: TenantDirectory::new(Arc::clone(&store)),
            chart: ChartOfAccounts::new(Arc::clone(&store)),
            journal: JournalEngine::new(Arc::clone(&store)),
            reference: ReferenceData::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn directory(&self) -> &TenantDirectory<S> {
        &self.directory
    }

    pub fn chart(&self) -> &ChartOfAccounts<S> {
        &self.chart
    }

    pub fn journal(&self) -> &JournalEngine<S> {
        &self.journal
    }

    pub fn reference(&self) -> &ReferenceData<S> {
        &self.reference
    }

    // Tenants

    pub async fn create_tenant(&self, ctx: &OperationContext, name: &str) -> LedgerResult<Tenant> {
        self.directory.create_tenant(ctx, name).await
    }

    pub async fn get_tenant(&self, ctx: &OperationContext, id: TenantId) -> LedgerResult<Tenant> {
        self.directory.get_tenant(ctx, id).await
    }

    pub async fn get_tenant_by_name(&self, ctx: &OperationContext, name: &str) -> LedgerResult<Tenant> {
        self.directory.get_tenant_by_name(ctx, name).await
    }

    // Accounts

    pub async fn create_account(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        params: NewAccount,
    ) -> LedgerResult<Account> {
        self.chart.create_account(ctx, tenant_id, params).await
    }

    pub async fn get_account(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        account_id: AccountId,
    ) -> LedgerResult<Account> {
        self.chart.get_account(ctx, tenant_id, account_id).await
    }

    pub async fn list_accounts(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        filter: AccountFilter,
        page: PageRequest,
    ) -> LedgerResult<Page<Account>> {
        self.chart.list_accounts(ctx, tenant_id, filter, page).await
    }

    pub async fn get_account_balance(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        account_id: AccountId,
    ) -> LedgerResult<AccountBalance> {
        self.chart.get_balance(ctx, tenant_id, account_id).await
    }

    // Journal

    pub async fn create_journal_entry(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        params: NewJournalEntry,
    ) -> LedgerResult<JournalEntry> {
        self.journal.create_journal_entry(ctx, tenant_id, params).await
    }

    pub async fn get_journal_entry(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        entry_id: JournalEntryId,
    ) -> LedgerResult<JournalEntry> {
        self.journal.get_journal_entry(ctx, tenant_id, entry_id).await
    }

    pub async fn list_journal_entries(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        filter: JournalFilter,
        page: PageRequest,
    ) -> LedgerResult<Page<JournalEntry>> {
        self.journal
            .list_journal_entries(ctx, tenant_id, filter, page)
            .await
    }

    // Reference data

    pub async fn list_account_types(&self, ctx: &OperationContext) -> LedgerResult<Vec<AccountType>> {
        self.reference.list_account_types(ctx).await
    }

    pub async fn list_currencies(&self, ctx: &OperationContext) -> LedgerResult<Vec<Currency>> {
        self.reference.list_currencies(ctx).await
    }
}
