//! Chart of accounts: per-tenant accounts and their running balances.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use tally_accounting::{Account, AccountBalance, NewAccount};
use tally_core::{AccountId, LedgerError, LedgerResult, OperationContext, Page, PageRequest, TenantId};
use tally_infra::{AccountFilter, LedgerStore, ScopedSession};

use crate::deadline::before_deadline;

#[derive(Debug)]
pub struct ChartOfAccounts<S> {
    store: Arc<S>,
}

impl<S> Clone for ChartOfAccounts<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> ChartOfAccounts<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Open an account together with its zero balance.
    ///
    /// - `InvalidInput`: empty number/name, unknown account type or currency,
    ///   or a parent that does not resolve inside this tenant
    /// - `FailedPrecondition`: the account number is already used by the tenant
    #[instrument(
        skip(self, ctx, params),
        fields(tenant_id = %tenant_id, account_number = %params.account_number),
        err
    )]
    pub async fn create_account(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        params: NewAccount,
    ) -> LedgerResult<Account> {
        params.validate()?;

        let (session, account) = before_deadline(ctx, async {
            let mut session = self.store.scope(tenant_id, ctx).await?;

            if !session.account_type_exists(params.account_type_id).await? {
                return Err(LedgerError::invalid_input(format!(
                    "unknown account type {}",
                    params.account_type_id
                )));
            }
            if !session.currency_exists(&params.currency_code).await? {
                return Err(LedgerError::invalid_input(format!(
                    "unknown currency {}",
                    params.currency_code
                )));
            }
            if let Some(parent) = params.parent_account_id {
                // Lookups are tenant-filtered, so another tenant's id is "not found" here.
                if session.find_account(parent).await?.is_none() {
                    return Err(LedgerError::invalid_input(format!(
                        "parent account {parent} not found"
                    )));
                }
            }
            if session.account_number_exists(&params.account_number).await? {
                return Err(LedgerError::failed_precondition(format!(
                    "account number {} already exists",
                    params.account_number
                )));
            }

            let now = Utc::now();
            let account = Account::open(tenant_id, params, now)?;
            session
                .insert_account(&account, &AccountBalance::zero(account.id, now))
                .await?;
            Ok((session, account))
        })
        .await?;

        session.commit().await?;
        info!(account_id = %account.id, "account created");
        Ok(account)
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %tenant_id), err)]
    pub async fn get_account(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        account_id: AccountId,
    ) -> LedgerResult<Account> {
        before_deadline(ctx, async {
            let mut session = self.store.scope(tenant_id, ctx).await?;
            session.find_account(account_id).await
        })
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("account {account_id}")))
    }

    /// Newest first. Paging values are clamped, never rejected.
    #[instrument(skip(self, ctx), fields(tenant_id = %tenant_id), err)]
    pub async fn list_accounts(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        filter: AccountFilter,
        page: PageRequest,
    ) -> LedgerResult<Page<Account>> {
        let pagination = page.clamp();
        before_deadline(ctx, async {
            let mut session = self.store.scope(tenant_id, ctx).await?;
            session.list_accounts(&filter, pagination).await
        })
        .await
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %tenant_id), err)]
    pub async fn get_balance(
        &self,
        ctx: &OperationContext,
        tenant_id: TenantId,
        account_id: AccountId,
    ) -> LedgerResult<AccountBalance> {
        before_deadline(ctx, async {
            let mut session = self.store.scope(tenant_id, ctx).await?;
            session.balance(account_id).await
        })
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("balance for account {account_id}")))
    }
}
