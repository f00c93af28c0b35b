use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::TenantId;

use crate::error::ValidationError;

/// An isolated customer/organization. Root of every tenant-scoped row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Allocate a new tenant. Names need not be unique.
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("tenant name"));
        }

        Ok(Self {
            id: TenantId::new(),
            name,
            created_at: now,
            updated_at: now,
        })
    }
}
