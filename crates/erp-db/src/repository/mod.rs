//! # Repository Module
//!
//! Database repository implementations for Boxwork ERP.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RecordUsecase (erp-core)                                              │
//! │       │                                                                 │
//! │       │  Arc<dyn RecordRepository>                                      │
//! │       ▼                                                                 │
//! │  SqliteRecordRepository                                                │
//! │  ├── list(&self, module_key)                                           │
//! │  ├── insert(&self, module_key, payload, created_by)                    │
//! │  ├── replace(&self, module_key, id, payload, updated_by)               │
//! │  └── remove(&self, module_key, id)                                     │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database (module_records)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SqliteRecordRepository`](record::SqliteRecordRepository) - Module record CRUD

pub mod record;
