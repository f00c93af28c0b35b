#![allow(dead_code)]

use chrono::Utc;

use tally_ledger::{
    Account, InMemoryLedgerStore, Ledger, NewAccount, NewJournalEntry, NewJournalLine,
    OperationContext, StoreConfig, Tenant,
};

pub const ASSET: i32 = 1;
pub const REVENUE: i32 = 4;
pub const EXPENSE: i32 = 5;

pub type MemLedger = Ledger<InMemoryLedgerStore>;

pub fn ctx() -> OperationContext {
    OperationContext::background()
}

pub fn ledger() -> MemLedger {
    Ledger::in_memory(StoreConfig::default())
}

pub fn ledger_with(max_sessions: usize, acquire_timeout_ms: u64) -> MemLedger {
    Ledger::in_memory(StoreConfig {
        max_sessions,
        acquire_timeout_ms,
    })
}

pub async fn tenant(ledger: &MemLedger, name: &str) -> Tenant {
    ledger.create_tenant(&ctx(), name).await.unwrap()
}

pub async fn account(ledger: &MemLedger, tenant: &Tenant, number: &str, name: &str, type_id: i32) -> Account {
    ledger
        .create_account(&ctx(), tenant.id, NewAccount::new(number, name, type_id, "USD"))
        .await
        .unwrap()
}

pub fn transfer(
    debit: &Account,
    credit: &Account,
    debit_amount: &str,
    credit_amount: &str,
) -> NewJournalEntry {
    NewJournalEntry::new(
        "JE",
        "transfer",
        Utc::now(),
        vec![
            NewJournalLine::debit(debit.id, debit_amount),
            NewJournalLine::credit(credit.id, credit_amount),
        ],
    )
}
