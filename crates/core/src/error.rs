//! Ledger error model.

use thiserror::Error;

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Coarse classification of a [`LedgerError`].
///
/// Callers map these onto their own transport representation (status codes,
/// exit codes, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    FailedPrecondition,
    Unavailable,
    Internal,
}

/// Caller-facing ledger error.
///
/// Every operation either fully succeeds or fails with exactly one of these;
/// there are no partial successes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or missing required field. Never retried automatically.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced entity does not exist within the caller's tenant scope.
    #[error("not found: {0}")]
    NotFound(String),

    /// A business invariant would be violated (e.g. unbalanced entry).
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// Session pool exhausted, deadline exceeded or store unreachable.
    /// Safe to retry with backoff.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Unexpected storage fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Only `Unavailable` failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Human-readable detail without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(m)
            | Self::NotFound(m)
            | Self::FailedPrecondition(m)
            | Self::Unavailable(m)
            | Self::Internal(m) => m,
        }
    }
}
