//! Accounting module (double-entry ledger, multi-tenant).
//!
//! Pure domain logic only: no IO, no persistence concerns. Everything here
//! can be validated and tested without a store.

pub mod account;
pub mod balance;
pub mod error;
pub mod journal;
pub mod reference;
pub mod tenant;

pub use account::{Account, NewAccount};
pub use balance::{AccountBalance, BalanceDelta};
pub use error::ValidationError;
pub use journal::{
    EntrySide, JournalEntry, JournalEntryLine, NewJournalEntry, NewJournalLine, ValidatedEntry,
    ValidatedLine, MIN_LINES,
};
pub use reference::{AccountType, Currency, NormalBalance};
pub use tenant::Tenant;
