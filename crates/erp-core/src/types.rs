//! # Domain Types
//!
//! Core domain types used throughout Boxwork ERP.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ModuleRecord   │   │   ModuleKey     │   │  WorkflowBox    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  partners       │   │  草稿箱 draft    │       │
//! │  │  module_key     │   │  quotations     │   │  待批箱 pending  │       │
//! │  │  code / box     │   │  settlements    │   │  已批箱 approved │       │
//! │  │  payload (JSON) │   │  ... (11 total) │   │  ... (6 total)  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Schema-Flexible Payloads
//! Every document type shares one record shape. Type-specific fields live in
//! an open JSON object ([`Payload`]) that is validated against the module's
//! rule (see [`crate::rules`]) rather than a struct per document type.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// A record payload: string keys to arbitrary JSON values.
pub type Payload = Map<String, Value>;

/// What callers get back for a record: payload fields plus record metadata.
pub type RecordView = Map<String, Value>;

/// Keys the server manages; they are stripped from caller payloads.
pub const RESERVED_KEYS: [&str; 4] = ["id", "module_key", "created_at", "updated_at"];

// =============================================================================
// Module Key
// =============================================================================

/// Document type. The set is closed: unknown keys are never accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModuleKey {
    /// Customer / supplier master data.
    #[serde(rename = "partners")]
    Partners,
    /// Product catalogue entries.
    #[serde(rename = "products")]
    Products,
    /// Quotations sent to customers.
    #[serde(rename = "quotations")]
    Quotations,
    /// Export sales contracts.
    #[serde(rename = "exportSales")]
    ExportSales,
    /// Purchase contracts with suppliers.
    #[serde(rename = "purchaseContracts")]
    PurchaseContracts,
    /// Inbound (receiving) notices.
    #[serde(rename = "inbound")]
    Inbound,
    /// Inventory snapshots.
    #[serde(rename = "inventory")]
    Inventory,
    /// Shipment details (packing).
    #[serde(rename = "shipmentDetails")]
    ShipmentDetails,
    /// Outbound orders.
    #[serde(rename = "outbound")]
    Outbound,
    /// Settlements (receivables).
    #[serde(rename = "settlements")]
    Settlements,
    /// Bank receipts awaiting claim.
    #[serde(rename = "bankReceipts")]
    BankReceipts,
}

impl ModuleKey {
    /// Every document type, in menu order.
    pub const ALL: [ModuleKey; 11] = [
        ModuleKey::Partners,
        ModuleKey::Products,
        ModuleKey::Quotations,
        ModuleKey::ExportSales,
        ModuleKey::PurchaseContracts,
        ModuleKey::Inbound,
        ModuleKey::Inventory,
        ModuleKey::ShipmentDetails,
        ModuleKey::Outbound,
        ModuleKey::Settlements,
        ModuleKey::BankReceipts,
    ];

    /// The wire/storage key.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ModuleKey::Partners => "partners",
            ModuleKey::Products => "products",
            ModuleKey::Quotations => "quotations",
            ModuleKey::ExportSales => "exportSales",
            ModuleKey::PurchaseContracts => "purchaseContracts",
            ModuleKey::Inbound => "inbound",
            ModuleKey::Inventory => "inventory",
            ModuleKey::ShipmentDetails => "shipmentDetails",
            ModuleKey::Outbound => "outbound",
            ModuleKey::Settlements => "settlements",
            ModuleKey::BankReceipts => "bankReceipts",
        }
    }

    /// Resolves a caller-supplied key: trimmed, then matched exactly.
    ///
    /// ## Example
    /// ```rust
    /// use erp_core::ModuleKey;
    ///
    /// assert_eq!(ModuleKey::resolve(" quotations ").unwrap(), ModuleKey::Quotations);
    /// assert!(ModuleKey::resolve("").is_err());
    /// assert!(ModuleKey::resolve("no_such_module").is_err());
    /// ```
    pub fn resolve(raw: &str) -> Result<Self, CoreError> {
        raw.trim().parse()
    }
}

impl FromStr for ModuleKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| CoreError::InvalidModule(s.to_string()))
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Workflow Box
// =============================================================================

/// Lightweight workflow marker stored under the payload key `box`.
///
/// Not a state machine: no transitions are declared here, only the
/// vocabulary. The wire values are the labels the operators see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowBox {
    #[serde(rename = "草稿箱")]
    Draft,
    #[serde(rename = "待批箱")]
    Pending,
    #[serde(rename = "已批箱")]
    Approved,
    #[serde(rename = "招领箱")]
    Claim,
    #[serde(rename = "确认箱")]
    Confirmed,
    /// No approval needed.
    #[serde(rename = "免批")]
    Auto,
}

impl WorkflowBox {
    pub const ALL: [WorkflowBox; 6] = [
        WorkflowBox::Draft,
        WorkflowBox::Pending,
        WorkflowBox::Approved,
        WorkflowBox::Claim,
        WorkflowBox::Confirmed,
        WorkflowBox::Auto,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            WorkflowBox::Draft => "草稿箱",
            WorkflowBox::Pending => "待批箱",
            WorkflowBox::Approved => "已批箱",
            WorkflowBox::Claim => "招领箱",
            WorkflowBox::Confirmed => "确认箱",
            WorkflowBox::Auto => "免批",
        }
    }

    /// Looks up a marker by its exact wire value.
    pub fn from_label(label: &str) -> Option<Self> {
        WorkflowBox::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == label)
    }
}

impl fmt::Display for WorkflowBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Module Record
// =============================================================================

/// A stored document, as handed back by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Server-assigned identity.
    pub id: i64,

    /// Document type. Immutable after creation.
    pub module_key: ModuleKey,

    /// Business code echoed from `payload["code"]`.
    pub code: Option<String>,

    /// Workflow marker echoed from `payload["box"]`.
    #[serde(rename = "box")]
    pub box_name: Option<String>,

    /// Validated, normalized payload.
    pub payload: Payload,

    pub created_by_admin_id: Option<i64>,
    pub updated_by_admin_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ModuleRecord {
    /// Projects the record into the caller-facing view.
    ///
    /// ## Layout
    /// Payload fields, then `id`, `code` and `box` (only when non-empty),
    /// `module_key`, and Unix-epoch `created_at` / `updated_at`. Metadata
    /// wins over payload keys of the same name.
    pub fn to_view(&self) -> RecordView {
        let mut out = self.payload.clone();
        out.insert("id".to_string(), Value::from(self.id));
        if let Some(code) = self.code.as_deref().filter(|c| !c.is_empty()) {
            out.insert("code".to_string(), Value::from(code));
        }
        if let Some(box_name) = self.box_name.as_deref().filter(|b| !b.is_empty()) {
            out.insert("box".to_string(), Value::from(box_name));
        }
        out.insert(
            "module_key".to_string(),
            Value::from(self.module_key.as_str()),
        );
        out.insert(
            "created_at".to_string(),
            Value::from(self.created_at.timestamp()),
        );
        out.insert(
            "updated_at".to_string(),
            Value::from(self.updated_at.timestamp()),
        );
        out
    }
}

/// Reads `payload[key]` as a non-empty string (used for `code` and `box`).
pub fn payload_str<'a>(payload: &'a Payload, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================
