//! # Error Types
//!
//! Domain-specific error types for erp-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  erp-core errors (this file)                                           │
//! │  ├── CoreError        - What every usecase operation returns           │
//! │  └── ValidationError  - Why a payload was rejected                     │
//! │                                                                         │
//! │  erp-db errors (separate crate)                                        │
//! │  └── DbError          - Database operation failures → CoreError        │
//! │                                                                         │
//! │  erp-rpc errors (in app)                                               │
//! │  └── ApiError         - What the caller sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Caller                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure is single-cause: validation stops at the first violation,
//! so a `CoreError::InvalidRecord` always names exactly one field.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors returned by the rule engine and the record usecase.
///
/// The four sentinel kinds (`InvalidModule`, `InvalidRecord`,
/// `RecordNotFound`, `BadParam`) are what callers branch on; `Repository`
/// carries storage failures that are none of those.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown or blank document-type key.
    #[error("invalid module: '{0}'")]
    InvalidModule(String),

    /// The payload was rejected.
    ///
    /// ## When This Occurs
    /// - Payload missing or not a JSON object
    /// - Box value not a string or not in the allowed set
    /// - Derivation inputs malformed (items, shipDate, paymentCycleDays)
    /// - Required field empty, numeric field non-numeric or below minimum
    /// - Storage constraint violated
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] ValidationError),

    /// No record matches `(id, module_key)`.
    #[error("record not found: {module_key}#{id}")]
    RecordNotFound { module_key: String, id: i64 },

    /// A request parameter is unusable (e.g. a non-positive id).
    #[error("bad parameter: {0}")]
    BadParam(String),

    /// Storage failed for a reason the caller cannot fix by changing input.
    #[error("repository failure: {0}")]
    Repository(String),
}

impl CoreError {
    /// Creates a RecordNotFound error.
    pub fn not_found(module_key: impl Into<String>, id: i64) -> Self {
        CoreError::RecordNotFound {
            module_key: module_key.into(),
            id,
        }
    }

    /// Returns true for the `InvalidRecord` kind.
    pub fn is_invalid_record(&self) -> bool {
        matches!(self, CoreError::InvalidRecord(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Why a payload failed validation or derivation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("missing required field {field}")]
    Required { field: String },

    /// Field must be a string.
    #[error("field {field} must be a string")]
    NotString { field: String },

    /// Value is not in the allowed set.
    #[error("field {field} has illegal value '{value}'")]
    NotAllowed { field: String, value: String },

    /// Field must be numeric.
    #[error("field {field} must be a number")]
    NotNumeric { field: String },

    /// Numeric value is below the declared minimum.
    #[error("field {field} is out of range (minimum {min})")]
    OutOfRange { field: String, min: f64 },

    /// Invalid format (e.g. malformed items list, unparsable date).
    #[error("field {field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The payload as a whole is unusable.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl ValidationError {
    /// Name of the offending field, when the error is about one field.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::Required { field }
            | ValidationError::NotString { field }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::NotNumeric { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => Some(field),
            ValidationError::MalformedPayload(_) => None,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation and derivation steps.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customerName".to_string(),
        };
        assert_eq!(err.to_string(), "missing required field customerName");

        let err = ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 0.000001,
        };
        assert_eq!(
            err.to_string(),
            "field amount is out of range (minimum 0.000001)"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::NotNumeric {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(core_err.is_invalid_record());
        assert_eq!(
            core_err.to_string(),
            "invalid record: field quantity must be a number"
        );
    }

    #[test]
    fn test_field_accessor() {
        let err = ValidationError::NotAllowed {
            field: "box".to_string(),
            value: "unknown".to_string(),
        };
        assert_eq!(err.field(), Some("box"));
        assert_eq!(ValidationError::MalformedPayload("x".into()).field(), None);
    }

    #[test]
    fn test_not_found_message() {
        let err = CoreError::not_found("partners", 7);
        assert_eq!(err.to_string(), "record not found: partners#7");
    }
}
