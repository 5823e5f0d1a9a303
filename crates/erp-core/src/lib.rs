//! # erp-core: Module Rules for Boxwork ERP
//!
//! This crate decides whether a business document may be stored, and in
//! what form. It has no I/O of its own: storage is reached only through the
//! [`repository::RecordRepository`] trait.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Boxwork ERP Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 erp-rpc (JSON request adapter)                  │   │
//! │  │        list / create / update / delete  ──►  reply envelope     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ erp-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  usecase  │  │validation │  │   rules   │  │  derive   │  │   │
//! │  │   │  list     │  │ box rule  │  │ RuleBook  │  │ totals    │  │   │
//! │  │   │  create.. │  │ required  │  │ 11 types  │  │ dates     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │        numeric · items · types · error · repository (trait)    │   │
//! │  │                                                                 │   │
//! │  │   NO DATABASE • NO NETWORK • RULES ARE DATA                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ RecordRepository                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                     erp-db (SQLite via sqlx)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Document types, workflow markers, stored records
//! - [`numeric`] - Number coercion and canonical rendering
//! - [`items`] - Line-item extraction and sums
//! - [`derive`] - Computed fields (totals, package counts, receivable dates)
//! - [`rules`] - The per-document-type rule table
//! - [`validation`] - The engine that applies a rule to a payload
//! - [`repository`] - Storage contract
//! - [`usecase`] - List / create / update / delete
//! - [`error`] - Error types
//!
//! ## Example Usage
//!
//! ```rust
//! use erp_core::{apply_rules, RuleBook};
//! use serde_json::json;
//!
//! let book = RuleBook::standard();
//! let payload = json!({
//!     "invoiceNo": "INV-001",
//!     "shipDate": "2026-02-10",
//!     "paymentCycleDays": 30,
//!     "amount": "8000.50"
//! });
//!
//! let out = apply_rules(&book, "settlements", payload.as_object().unwrap()).unwrap();
//! assert_eq!(out["receivableDate"], json!("2026-03-12"));
//! assert_eq!(out["amount"], json!(8000.5));
//! assert_eq!(out["box"], json!("免批"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod derive;
pub mod error;
pub mod items;
pub mod numeric;
pub mod repository;
pub mod rules;
pub mod types;
pub mod usecase;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use repository::RecordRepository;
pub use rules::{ModuleRule, NumberRule, RuleBook};
pub use types::*;
pub use usecase::RecordUsecase;
pub use validation::apply_rules;
