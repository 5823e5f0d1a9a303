//! # erp-db: Database Layer for Boxwork ERP
//!
//! This crate stores module records in SQLite through sqlx and implements
//! the [`erp_core::RecordRepository`] contract.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Boxwork ERP Data Flow                            │
//! │                                                                         │
//! │  RecordUsecase::create("quotations", ...)                              │
//! │       │ validated payload                                               │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     erp-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │    Repository      │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ (record.rs)        │  │ (embedded) │  │   │
//! │  │   │  SqlitePool   │    │ SqliteRecordRepo.. │  │ 001_...sql │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use erp_core::{RecordUsecase, RuleBook};
//! use erp_db::{Database, DbConfig};
//!
//! let db = Database::open(DbConfig::file("./erp.db")).await?;
//! let usecase = RecordUsecase::new(Arc::new(RuleBook::standard()), Arc::new(db.records()));
//! let partners = usecase.list("partners").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig, DbLocation};
pub use repository::record::SqliteRecordRepository;
