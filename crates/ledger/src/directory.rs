//! Tenant directory: the root of isolation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use tally_accounting::Tenant;
use tally_core::{LedgerError, LedgerResult, OperationContext, TenantId};
use tally_infra::LedgerStore;

use crate::deadline::before_deadline;

#[derive(Debug)]
pub struct TenantDirectory<S> {
    store: Arc<S>,
}

impl<S> Clone for TenantDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> TenantDirectory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Register a tenant. Names are not unique.
    #[instrument(skip(self, ctx), err)]
    pub async fn create_tenant(&self, ctx: &OperationContext, name: &str) -> LedgerResult<Tenant> {
        let tenant = Tenant::new(name, Utc::now())?;
        before_deadline(ctx, self.store.insert_tenant(&tenant)).await?;

        info!(tenant_id = %tenant.id, "tenant created");
        Ok(tenant)
    }

    #[instrument(skip(self, ctx), err)]
    pub async fn get_tenant(&self, ctx: &OperationContext, id: TenantId) -> LedgerResult<Tenant> {
        before_deadline(ctx, self.store.tenant_by_id(id))
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("tenant {id}")))
    }

    /// With duplicate names, the earliest created tenant wins.
    #[instrument(skip(self, ctx), err)]
    pub async fn get_tenant_by_name(&self, ctx: &OperationContext, name: &str) -> LedgerResult<Tenant> {
        before_deadline(ctx, self.store.tenant_by_name(name))
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("tenant named {name:?}")))
    }
}
