use std::sync::Arc;

use tally_accounting::{AccountType, Currency};
use tally_core::{LedgerResult, OperationContext};
use tally_infra::LedgerStore;

use crate::deadline::before_deadline;

/// Read-only global catalogues.
#[derive(Debug)]
pub struct ReferenceData<S> {
    store: Arc<S>,
}

impl<S> Clone for ReferenceData<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> ReferenceData<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Ordered by id.
    pub async fn list_account_types(&self, ctx: &OperationContext) -> LedgerResult<Vec<AccountType>> {
        before_deadline(ctx, self.store.list_account_types()).await
    }

    /// Ordered by code.
    pub async fn list_currencies(&self, ctx: &OperationContext) -> LedgerResult<Vec<Currency>> {
        before_deadline(ctx, self.store.list_currencies()).await
    }
}
