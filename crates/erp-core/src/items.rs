//! # Line Items
//!
//! Extraction of the nested `items` list carried by quotations, contracts
//! and shipments, plus the sums the derivations need.
//!
//! ## Accepted Shapes
//! ```text
//! items: absent / null          → []           (nothing to sum)
//! items: [ {..}, null, {..} ]   → [ {..}, {..} ] (nulls dropped)
//! items: [ {..}, "oops" ]       → error         (never silently skipped)
//! items: "oops" / 3 / {..}      → error
//! ```

use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationResult};
use crate::numeric::opt_to_float;

/// Payload key holding the line items.
pub const ITEMS_FIELD: &str = "items";

/// Item key holding the quantity.
pub const QUANTITY_FIELD: &str = "quantity";

/// Item key holding the unit price.
pub const UNIT_PRICE_FIELD: &str = "unitPrice";

/// Returns the line items in order.
///
/// ## Errors
/// `InvalidFormat` on `items` when the field is not a list, or when any
/// non-null entry is not an object.
pub fn extract_items(raw: Option<&Value>) -> ValidationResult<Vec<&Map<String, Value>>> {
    let rows = match raw {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(rows)) => rows,
        Some(_) => return Err(malformed("items must be a list")),
    };

    let mut out = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match row {
            Value::Null => continue,
            Value::Object(item) => out.push(item),
            _ => return Err(malformed(&format!("item #{index} must be an object"))),
        }
    }
    Ok(out)
}

fn malformed(reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: ITEMS_FIELD.to_string(),
        reason: reason.to_string(),
    }
}

// =============================================================================
// Sums
// =============================================================================

/// Aggregate figures over a list of items.
///
/// Item fields that do not coerce to a number count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemsSummary {
    /// Number of items (null entries excluded).
    pub count: usize,
    /// Σ quantity
    pub total_qty: f64,
    /// Σ quantity × unitPrice
    pub total_amount: f64,
}

impl ItemsSummary {
    pub fn of(items: &[&Map<String, Value>]) -> Self {
        items.iter().fold(
            ItemsSummary {
                count: items.len(),
                ..ItemsSummary::default()
            },
            |mut acc, item| {
                let qty = item_number(item, QUANTITY_FIELD);
                let price = item_number(item, UNIT_PRICE_FIELD);
                acc.total_qty += qty;
                acc.total_amount += qty * price;
                acc
            },
        )
    }
}

fn item_number(item: &Map<String, Value>, key: &str) -> f64 {
    opt_to_float(item.get(key)).unwrap_or(0.0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_or_null_items_are_empty() {
        assert!(extract_items(None).unwrap().is_empty());
        assert!(extract_items(Some(&Value::Null)).unwrap().is_empty());
        assert!(extract_items(Some(&json!([]))).unwrap().is_empty());
    }

    #[test]
    fn test_null_entries_are_dropped() {
        let raw = json!([{"quantity": 1}, null, {"quantity": 2}]);
        let items = extract_items(Some(&raw)).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["quantity"], json!(2));
    }

    #[test]
    fn test_malformed_items_are_rejected() {
        for raw in [json!("oops"), json!(3), json!({"quantity": 1}), json!([{"a": 1}, "x"])] {
            let err = extract_items(Some(&raw)).unwrap_err();
            assert_eq!(err.field(), Some("items"), "{raw}");
        }
    }

    #[test]
    fn test_summary_sums_and_ignores_unparsable() {
        let raw = json!([
            {"quantity": 2, "unitPrice": 5},
            {"quantity": "3", "unitPrice": "10"},
            {"quantity": "n/a", "unitPrice": 99},
            {"unitPrice": 4}
        ]);
        let items = extract_items(Some(&raw)).unwrap();
        let summary = ItemsSummary::of(&items);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.total_qty, 5.0);
        assert_eq!(summary.total_amount, 40.0);
    }
}
