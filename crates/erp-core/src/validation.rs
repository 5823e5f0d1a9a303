//! # Validation & Normalization Engine
//!
//! Turns a caller payload into a stored payload, or explains (with exactly
//! one cause) why it cannot be stored.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_rules(book, "quotations", payload)                               │
//! │       │                                                                 │
//! │       ├── 1. resolve rule           unknown key → InvalidModule         │
//! │       ├── 2. clone payload          caller data is never touched        │
//! │       ├── 3. box rule               missing → default, unknown → error  │
//! │       ├── 4. derive                 totals / packages / receivable date │
//! │       ├── 5. required fields        first empty field → error           │
//! │       ├── 6. numeric fields         coerce, check minimum, normalize    │
//! │       │                                                                 │
//! │       └── 7. normalized payload ──► repository                          │
//! │                                                                         │
//! │  Every failure after step 1 is InvalidRecord. The first one wins.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use erp_core::rules::RuleBook;
//! use erp_core::validation::apply_rules;
//! use serde_json::json;
//!
//! let book = RuleBook::standard();
//! let payload = json!({
//!     "customerName": "ACME",
//!     "quotedDate": "2026-02-10",
//!     "currency": "USD",
//!     "items": [{"quantity": 2, "unitPrice": 5}, {"quantity": 3, "unitPrice": 10}]
//! });
//!
//! let out = apply_rules(&book, "quotations", payload.as_object().unwrap()).unwrap();
//! assert_eq!(out["totalAmount"], json!(40));
//! assert_eq!(out["box"], json!("草稿箱"));
//! ```

use serde_json::Value;

use crate::error::{CoreResult, ValidationError, ValidationResult};
use crate::numeric::{normalize, opt_to_float, to_float};
use crate::rules::{ModuleRule, NumberRule, RuleBook};
use crate::types::{ModuleKey, Payload, WorkflowBox};

/// Payload key holding the workflow marker.
pub const BOX_FIELD: &str = "box";

// =============================================================================
// Entry Points
// =============================================================================

/// Validates and normalizes `payload` for the document type `module_key`.
///
/// The key is trimmed before lookup. The input map is not modified; the
/// returned map is what should be persisted.
///
/// ## Errors
/// - `InvalidModule` when the key is blank or has no rule
/// - `InvalidRecord` for any payload problem (first one found)
pub fn apply_rules(book: &RuleBook, module_key: &str, payload: &Payload) -> CoreResult<Payload> {
    let key = book.resolve(module_key)?;
    apply_module_rules(book, key, payload)
}

/// Like [`apply_rules`] for an already-resolved key.
pub fn apply_module_rules(book: &RuleBook, key: ModuleKey, payload: &Payload) -> CoreResult<Payload> {
    let rule = book.rule(key)?;
    Ok(apply_rule(rule, payload)?)
}

/// Runs steps 2 to 7 of the pipeline against one rule.
pub fn apply_rule(rule: &ModuleRule, payload: &Payload) -> ValidationResult<Payload> {
    let mut out = payload.clone();

    apply_box_rule(&mut out, rule.default_box)?;

    if let Some(derive) = rule.derive {
        derive(&mut out)?;
    }

    check_required(&out, &rule.required_fields)?;
    apply_number_rules(&mut out, &rule.number_rules)?;

    Ok(out)
}

// =============================================================================
// Steps
// =============================================================================

/// Fills in or checks the workflow marker.
///
/// ## Rules
/// - absent or empty (see [`is_empty_value`]) → `default_box`
/// - present but not a string → `NotString`
/// - trimmed value not one of the six markers → `NotAllowed`
/// - otherwise the trimmed marker is written back
pub fn apply_box_rule(payload: &mut Payload, default_box: WorkflowBox) -> ValidationResult<()> {
    let marker = match payload.get(BOX_FIELD) {
        Some(raw) if !is_empty_value(raw) => {
            let label = raw.as_str().ok_or_else(|| ValidationError::NotString {
                field: BOX_FIELD.to_string(),
            })?;
            let label = label.trim();
            WorkflowBox::from_label(label).ok_or_else(|| ValidationError::NotAllowed {
                field: BOX_FIELD.to_string(),
                value: label.to_string(),
            })?
        }
        _ => default_box,
    };

    payload.insert(BOX_FIELD.to_string(), Value::from(marker.as_str()));
    Ok(())
}

/// Fails on the first required field that is missing or empty.
pub fn check_required(payload: &Payload, fields: &[&str]) -> ValidationResult<()> {
    for field in fields {
        let present = payload.get(*field).is_some_and(|v| !is_empty_value(v));
        if !present {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

/// Coerces each declared numeric field, normalizes it, checks the normalized
/// value against its minimum, and writes it back. Rules are applied in
/// declared order.
///
/// A missing field is treated as non-numeric.
pub fn apply_number_rules(payload: &mut Payload, rules: &[NumberRule]) -> ValidationResult<()> {
    for rule in rules {
        let value = opt_to_float(payload.get(rule.field)).ok_or_else(|| {
            ValidationError::NotNumeric {
                field: rule.field.to_string(),
            }
        })?;

        // The stored form must satisfy the minimum, not just the input
        let normalized = normalize(value);
        if let Some(min) = rule.min {
            let stored = to_float(&normalized).unwrap_or(value);
            if stored < min {
                return Err(ValidationError::OutOfRange {
                    field: rule.field.to_string(),
                    min,
                });
            }
        }

        payload.insert(rule.field.to_string(), normalized);
    }
    Ok(())
}

/// Emptiness as the required-field check sees it: null, a blank string, an
/// empty list, or an empty object. Numbers and booleans are never empty.
///
/// ## Example
/// ```rust
/// use erp_core::validation::is_empty_value;
/// use serde_json::json;
///
/// assert!(is_empty_value(&json!("   ")));
/// assert!(is_empty_value(&json!([])));
/// assert!(!is_empty_value(&json!(0)));
/// assert!(!is_empty_value(&json!(false)));
/// ```
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(list) => list.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
