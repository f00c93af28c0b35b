//! `tally-core` — foundation building blocks shared by every ledger crate.
//!
//! This crate contains **pure** primitives (no infrastructure concerns):
//! identifiers, the caller-facing error model, pagination rules and the
//! per-operation context.

pub mod context;
pub mod error;
pub mod id;
pub mod pagination;

pub use context::OperationContext;
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use id::{AccountId, JournalEntryId, JournalLineId, TenantId};
pub use pagination::{Page, PageRequest, Pagination};
