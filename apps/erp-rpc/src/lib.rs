//! # Boxwork ERP RPC
//!
//! JSON request adapter over the record usecase, plus the line server the
//! `erp-rpc` binary runs on stdin/stdout.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         erp-rpc                                         │
//! │                                                                         │
//! │  stdin ──► server::serve ──► RpcHandler ──► RecordUsecase ──► SQLite   │
//! │                 │                 │                                     │
//! │  stdout ◄───────┘   reply line ◄──┘  (ApiError on failure)             │
//! │                                                                         │
//! │  stderr ◄── tracing                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]: defaults, then `erp-rpc.toml`, then `ERP_*` variables.
//! `RUST_LOG` overrides the configured log filter.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod server;

use std::sync::Arc;

use erp_core::{RecordUsecase, RuleBook};
use erp_db::{Database, DbConfig, DbResult};
use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, RpcConfig};
pub use dispatch::{RpcHandler, RpcReply, RpcRequest};
pub use error::{ApiError, ErrorCode};
pub use server::serve;

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr; stdout carries replies only.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=erp=trace` - Show trace for erp crates only
/// - Default: `default_filter` (from config)
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Opens the database and wires the handler over the standard rule book.
pub async fn open(config: &RpcConfig) -> DbResult<(RpcHandler, Database)> {
    let db_config = DbConfig::from_path(&config.database_path)
        .pool_size(config.max_connections)
        .migrate(config.run_migrations);
    let db = Database::open(db_config).await?;

    let usecase = RecordUsecase::new(Arc::new(RuleBook::standard()), Arc::new(db.records()));
    Ok((RpcHandler::new(usecase), db))
}
