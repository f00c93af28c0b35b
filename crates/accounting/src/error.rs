//! Deterministic domain rejections.

use rust_decimal::Decimal;
use thiserror::Error;

use tally_core::{AccountId, LedgerError};

use crate::journal::EntrySide;

/// Why a tenant, account or journal entry was rejected before touching a store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("journal entry must have at least two lines (got {0})")]
    TooFewLines(usize),

    #[error("invalid {side} amount at line {line}: {reason}")]
    InvalidAmount {
        line: usize,
        side: EntrySide,
        reason: String,
    },

    #[error("negative {side} amount at line {line}")]
    NegativeAmount { line: usize, side: EntrySide },

    #[error("amount overflow while totalling {0} side")]
    AmountOverflow(EntrySide),

    #[error("entry not balanced: debits {debits} != credits {credits}")]
    Unbalanced { debits: Decimal, credits: Decimal },

    #[error("metadata must be a JSON object")]
    MetadataNotObject,

    #[error("balance overflow on account {0}")]
    BalanceOverflow(AccountId),
}

impl From<ValidationError> for LedgerError {
    fn from(value: ValidationError) -> Self {
        match value {
            ValidationError::Unbalanced { .. } | ValidationError::BalanceOverflow(_) => {
                LedgerError::failed_precondition(value.to_string())
            }
            other => LedgerError::invalid_input(other.to_string()),
        }
    }
}
