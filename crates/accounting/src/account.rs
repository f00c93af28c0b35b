use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::{AccountId, TenantId};

use crate::error::ValidationError;

/// An account in a tenant's chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub tenant_id: TenantId,
    /// Unique within the tenant, e.g. "1000".
    pub account_number: String,
    pub name: String,
    pub description: Option<String>,
    pub account_type_id: i32,
    pub currency_code: String,
    /// Another account of the same tenant.
    pub parent_account_id: Option<AccountId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for opening an account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewAccount {
    pub account_number: String,
    pub name: String,
    pub description: Option<String>,
    pub account_type_id: i32,
    pub currency_code: String,
    pub parent_account_id: Option<AccountId>,
}

impl NewAccount {
    pub fn new(
        account_number: impl Into<String>,
        name: impl Into<String>,
        account_type_id: i32,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            name: name.into(),
            description: None,
            account_type_id,
            currency_code: currency_code.into(),
            parent_account_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parent(mut self, parent: AccountId) -> Self {
        self.parent_account_id = Some(parent);
        self
    }

    /// Field-level checks that need no store access.
    ///
    /// Type, currency and parent resolution happen in the chart manager, inside
    /// the tenant's scope.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.account_number.trim().is_empty() {
            return Err(ValidationError::MissingField("account number"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("account name"));
        }
        if self.currency_code.trim().is_empty() {
            return Err(ValidationError::MissingField("currency code"));
        }
        Ok(())
    }
}

impl Account {
    /// Open a new, active account for `tenant_id`.
    pub fn open(
        tenant_id: TenantId,
        params: NewAccount,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        params.validate()?;

        // An empty description is the same as none.
        let description = params.description.filter(|d| !d.is_empty());

        Ok(Self {
            id: AccountId::new(),
            tenant_id,
            account_number: params.account_number,
            name: params.name,
            description,
            account_type_id: params.account_type_id,
            currency_code: params.currency_code,
            parent_account_id: params.parent_account_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}
