//! # Server Configuration
//!
//! Layered configuration for the `erp-rpc` binary.
//!
//! ## Sources (later wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Built-in defaults        database_path = "erp.db"                  │
//! │                              max_connections = 5                       │
//! │                              log_filter = "info,erp=debug,sqlx=warn"   │
//! │                              run_migrations = true                     │
//! │  2. erp-rpc.toml             optional, in the working directory        │
//! │  3. ERP_* environment        ERP_DATABASE_PATH, ERP_MAX_CONNECTIONS,   │
//! │                              ERP_LOG_FILTER, ERP_RUN_MIGRATIONS        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Name of the optional config file (extension resolved by `config`).
pub const CONFIG_FILE: &str = "erp-rpc";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "ERP";

pub const DEFAULT_LOG_FILTER: &str = "info,erp=debug,sqlx=warn";

/// erp-rpc configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// SQLite database file, or `:memory:`.
    pub database_path: String,

    /// Connection pool size.
    pub max_connections: u32,

    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Apply pending migrations on startup.
    pub run_migrations: bool,
}

impl RpcConfig {
    /// Loads defaults, then `erp-rpc.toml` if present, then `ERP_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        Self::build(builder)
    }

    /// Loads defaults overlaid with a TOML document.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let builder = Self::defaults()?.add_source(File::from_str(toml, FileFormat::Toml));
        Self::build(builder)
    }

    fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("database_path", "erp.db")?
            .set_default("max_connections", 5)?
            .set_default("log_filter", DEFAULT_LOG_FILTER)?
            .set_default("run_migrations", true)?)
    }

    fn build(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        let config: RpcConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        Ok(())
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        RpcConfig {
            database_path: "erp.db".to_string(),
            max_connections: 5,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            run_migrations: true,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
}
