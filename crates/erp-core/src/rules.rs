//! # Module Rule Table
//!
//! What each document type requires before it may be stored.
//!
//! ## Rule Anatomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ModuleRule                                                             │
//! │  ├── default_box      marker used when the caller omits `box`           │
//! │  ├── required_fields  must be non-empty AFTER derivation                │
//! │  ├── number_rules     field → inclusive minimum (checked in order)      │
//! │  └── derive           optional fn(&mut Payload) computing fields        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rules are data. A [`RuleBook`] is built once at startup (usually with
//! [`RuleBook::standard`]) and shared read-only by the engine and usecase.

use std::collections::HashMap;

use crate::derive::{derive_receivable_date, derive_total_amount, derive_total_packages, DeriveFn};
use crate::error::CoreError;
use crate::types::{ModuleKey, WorkflowBox};

/// Smallest accepted value for fields that must be strictly positive.
pub const POSITIVE_MIN: f64 = 0.000001;

// =============================================================================
// Rule Types
// =============================================================================

/// Range constraint for one numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRule {
    pub field: &'static str,
    /// Inclusive minimum; `None` means "numeric, unbounded".
    pub min: Option<f64>,
}

impl NumberRule {
    pub const fn min(field: &'static str, min: f64) -> Self {
        NumberRule {
            field,
            min: Some(min),
        }
    }

    pub const fn any(field: &'static str) -> Self {
        NumberRule { field, min: None }
    }
}

/// Everything the engine needs to validate one document type.
#[derive(Debug, Clone)]
pub struct ModuleRule {
    pub default_box: WorkflowBox,
    pub required_fields: Vec<&'static str>,
    pub number_rules: Vec<NumberRule>,
    pub derive: Option<DeriveFn>,
}

impl ModuleRule {
    pub fn new(default_box: WorkflowBox) -> Self {
        ModuleRule {
            default_box,
            required_fields: Vec::new(),
            number_rules: Vec::new(),
            derive: None,
        }
    }

    pub fn required(mut self, fields: &[&'static str]) -> Self {
        self.required_fields.extend_from_slice(fields);
        self
    }

    pub fn number(mut self, rule: NumberRule) -> Self {
        self.number_rules.push(rule);
        self
    }

    pub fn derive(mut self, derive: DeriveFn) -> Self {
        self.derive = Some(derive);
        self
    }
}

// =============================================================================
// Rule Book
// =============================================================================

/// Read-only table from document type to rule.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: HashMap<ModuleKey, ModuleRule>,
}

impl RuleBook {
    /// An empty book. Every lookup fails until rules are added.
    pub fn empty() -> Self {
        RuleBook::default()
    }

    /// Adds (or replaces) the rule for one document type.
    pub fn with_rule(mut self, key: ModuleKey, rule: ModuleRule) -> Self {
        self.rules.insert(key, rule);
        self
    }

    /// Looks up the rule for a document type.
    ///
    /// ## Errors
    /// `InvalidModule` when the book has no rule for `key`.
    pub fn rule(&self, key: ModuleKey) -> Result<&ModuleRule, CoreError> {
        self.rules
            .get(&key)
            .ok_or_else(|| CoreError::InvalidModule(key.as_str().to_string()))
    }

    /// Resolves a caller-supplied key (trimmed) to a document type that has
    /// a rule in this book.
    pub fn resolve(&self, raw: &str) -> Result<ModuleKey, CoreError> {
        let key = ModuleKey::resolve(raw)?;
        self.rule(key)?;
        Ok(key)
    }

    pub fn contains(&self, key: ModuleKey) -> bool {
        self.rules.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The production rule table for all eleven document types.
    pub fn standard() -> Self {
        use ModuleKey::*;
        use WorkflowBox::{Auto, Claim, Draft};

        RuleBook::empty()
            .with_rule(
                Partners,
                ModuleRule::new(Auto)
                    .required(&[
                        "partnerType",
                        "name",
                        "address",
                        "contact",
                        "contactPhone",
                        "paymentCycleDays",
                    ])
                    .number(NumberRule::min("paymentCycleDays", 0.0)),
            )
            .with_rule(
                Products,
                ModuleRule::new(Auto).required(&["hsCode", "specCode", "cnDesc", "enDesc"]),
            )
            .with_rule(
                Quotations,
                ModuleRule::new(Draft)
                    .required(&["customerName", "quotedDate", "currency", "items"])
                    .derive(derive_total_amount),
            )
            .with_rule(
                ExportSales,
                ModuleRule::new(Draft)
                    .required(&[
                        "customerName",
                        "customerContractNo",
                        "signDate",
                        "deliveryDate",
                        "transportType",
                        "orderFlow",
                        "items",
                    ])
                    .derive(derive_total_amount),
            )
            .with_rule(
                PurchaseContracts,
                ModuleRule::new(Draft)
                    .required(&[
                        "supplierName",
                        "signDate",
                        "salesNo",
                        "deliveryDate",
                        "deliveryAddress",
                        "invoiceRequired",
                        "items",
                    ])
                    .derive(derive_total_amount),
            )
            .with_rule(
                Inbound,
                ModuleRule::new(Draft)
                    .required(&[
                        "purchaseCode",
                        "productName",
                        "warehouseName",
                        "location",
                        "qcStatus",
                        "quantity",
                    ])
                    .number(NumberRule::min("quantity", POSITIVE_MIN)),
            )
            .with_rule(
                Inventory,
                ModuleRule::new(Auto)
                    .required(&[
                        "productName",
                        "warehouseName",
                        "location",
                        "availableQty",
                        "lockedQty",
                    ])
                    .number(NumberRule::min("availableQty", 0.0))
                    .number(NumberRule::min("lockedQty", 0.0)),
            )
            .with_rule(
                ShipmentDetails,
                ModuleRule::new(Draft)
                    .required(&[
                        "customerName",
                        "startPort",
                        "destPort",
                        "shipToAddress",
                        "transportType",
                        "arriveCountry",
                        "salesOwner",
                        "items",
                    ])
                    .number(NumberRule::min("totalPackages", POSITIVE_MIN))
                    .derive(derive_total_packages),
            )
            .with_rule(
                Outbound,
                ModuleRule::new(Auto)
                    .required(&[
                        "shipmentCode",
                        "productName",
                        "quantity",
                        "warehouseName",
                        "location",
                    ])
                    .number(NumberRule::min("quantity", POSITIVE_MIN)),
            )
            .with_rule(
                Settlements,
                ModuleRule::new(Auto)
                    .required(&["invoiceNo", "shipDate", "paymentCycleDays", "amount"])
                    .number(NumberRule::min("paymentCycleDays", 0.0))
                    .number(NumberRule::min("amount", POSITIVE_MIN))
                    .derive(derive_receivable_date),
            )
            .with_rule(
                BankReceipts,
                ModuleRule::new(Claim)
                    .required(&["fundType", "refNo", "receivedAmount", "bankFee", "registerDate"])
                    .number(NumberRule::min("receivedAmount", POSITIVE_MIN))
                    .number(NumberRule::min("bankFee", 0.0)),
            )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_book_covers_every_module() {
        let book = RuleBook::standard();
        assert_eq!(book.len(), ModuleKey::ALL.len());
        for key in ModuleKey::ALL {
            assert!(book.contains(key), "missing rule for {key}");
        }
    }

    #[test]
    fn test_default_boxes() {
        let book = RuleBook::standard();
        let default_of = |key| book.rule(key).unwrap().default_box;
        assert_eq!(default_of(ModuleKey::Partners), WorkflowBox::Auto);
        assert_eq!(default_of(ModuleKey::Quotations), WorkflowBox::Draft);
        assert_eq!(default_of(ModuleKey::ShipmentDetails), WorkflowBox::Draft);
        assert_eq!(default_of(ModuleKey::BankReceipts), WorkflowBox::Claim);
    }

    #[test]
    fn test_derivations_wired_to_the_right_modules() {
        let book = RuleBook::standard();
        let derived: Vec<ModuleKey> = ModuleKey::ALL
            .into_iter()
            .filter(|key| book.rule(*key).unwrap().derive.is_some())
            .collect();
        assert_eq!(
            derived,
            vec![
                ModuleKey::Quotations,
                ModuleKey::ExportSales,
                ModuleKey::PurchaseContracts,
                ModuleKey::ShipmentDetails,
                ModuleKey::Settlements,
            ]
        );
    }

    #[test]
    fn test_every_number_rule_has_a_minimum() {
        let book = RuleBook::standard();
        for key in ModuleKey::ALL {
            for rule in &book.rule(key).unwrap().number_rules {
                assert!(rule.min.is_some(), "{key}.{} has no minimum", rule.field);
            }
        }
    }

    #[test]
    fn test_resolve_against_book() {
        let book = RuleBook::standard();
        assert_eq!(book.resolve(" settlements").unwrap(), ModuleKey::Settlements);
        assert!(matches!(book.resolve(""), Err(CoreError::InvalidModule(_))));

        let partial = RuleBook::empty().with_rule(ModuleKey::Products, ModuleRule::new(WorkflowBox::Auto));
        assert!(partial.resolve("products").is_ok());
        assert!(matches!(partial.resolve("partners"), Err(CoreError::InvalidModule(_))));
    }
}
