//! # Record Repository Contract
//!
//! The storage seam. erp-core only declares it; erp-db implements it over
//! SQLite and the usecase tests implement it in memory.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list_by_module(key)                 → records, most recent first       │
//! │  create(key, payload, created_by)    → stored record                    │
//! │  update(key, id, payload, updated_by)→ stored record | RecordNotFound   │
//! │  delete(key, id)                     → ()            | RecordNotFound   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payloads handed to the repository are already validated; implementations
//! store them as-is and never re-apply rules. `code` and `box` are echoed
//! from the payload into the record by the implementation.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{ModuleKey, ModuleRecord, Payload};

#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// All records of one document type, most recent first.
    async fn list_by_module(&self, module_key: ModuleKey) -> CoreResult<Vec<ModuleRecord>>;

    /// Stores a new record. `created_by` is recorded as both creator and
    /// last updater.
    async fn create(
        &self,
        module_key: ModuleKey,
        payload: Payload,
        created_by: Option<i64>,
    ) -> CoreResult<ModuleRecord>;

    /// Replaces the payload of `(id, module_key)`.
    ///
    /// ## Errors
    /// `RecordNotFound` when no row matches; a record of another document
    /// type with the same id does not match.
    async fn update(
        &self,
        module_key: ModuleKey,
        id: i64,
        payload: Payload,
        updated_by: Option<i64>,
    ) -> CoreResult<ModuleRecord>;

    /// Removes `(id, module_key)`.
    ///
    /// ## Errors
    /// `RecordNotFound` when no row matches.
    async fn delete(&self, module_key: ModuleKey, id: i64) -> CoreResult<()>;
}
