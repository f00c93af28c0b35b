//! Configuration loading and representation.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. `config/tally.toml` (optional)
//! 3. environment variables prefixed `TALLY`, `__`-separated
//!    (`TALLY__DATABASE__HOST`, `TALLY__STORE__MAX_SESSIONS`, ...)

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/tally.toml";
pub const ENV_PREFIX: &str = "TALLY";

const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(60 * 60);
const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub database: DatabaseConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            dbname: "ledger".to_string(),
            sslmode: "disable".to_string(),
            max_connections: 25,
            min_connections: 5,
            acquire_timeout_ms: 5_000,
        }
    }
}

/// Limits for the in-memory store's session pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub max_sessions: usize,
    pub acquire_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: 25,
            acquire_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

impl LedgerConfig {
    /// Load from `config/tally.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from `path` (if present) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: LedgerConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.store.validate()
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sessions == 0 {
            return Err(ConfigError::Invalid(
                "store.max_sessions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        self.ssl_mode().map(|_| ())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// libpq keyword/value connection string.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={} sslmode={}",
            self.host, self.port, self.user, self.password, self.dbname, self.sslmode
        )
    }

    fn ssl_mode(&self) -> Result<PgSslMode, ConfigError> {
        PgSslMode::from_str(&self.sslmode)
            .map_err(|e| ConfigError::Invalid(format!("database.sslmode: {e}")))
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
            .ssl_mode(self.ssl_mode()?))
    }

    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout())
            .max_lifetime(MAX_CONNECTION_LIFETIME)
            .idle_timeout(IDLE_TIMEOUT)
    }
}
