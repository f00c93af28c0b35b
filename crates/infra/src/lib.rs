//! Infrastructure layer: store contract, store implementations, configuration.

pub mod config;
pub mod in_memory;
pub mod postgres;
pub mod store;

pub use config::{ConfigError, DatabaseConfig, LedgerConfig, StoreConfig};
pub use in_memory::{InMemoryLedgerStore, InMemorySession};
pub use postgres::{PostgresLedgerStore, PostgresSession};
pub use store::{AccountFilter, JournalFilter, LedgerStore, ScopedSession};
