//! # API Error Types
//!
//! The serializable error that goes back to the caller inside a reply.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow: Usecase → Caller                         │
//! │                                                                         │
//! │  Usecase returns Err(CoreError::InvalidModule("widgets"))              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  From<CoreError> for ApiError                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError { code: INVALID_MODULE, message: "invalid module: ..." }     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Reply { "error": "invalid module: ...", "code": "INVALID_MODULE" }    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use erp_core::CoreError;
use serde::Serialize;

/// Error returned to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code.
    pub code: ErrorCode,

    /// Human-readable error message.
    pub message: String,
}

/// Error codes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown or blank document-type key.
    InvalidModule,
    /// Payload rejected by the module rules or by storage constraints.
    InvalidRecord,
    /// No record with that id under that document type.
    NotFound,
    /// Unusable request parameter (id, params shape).
    BadParam,
    /// The request line is not a JSON request envelope.
    ParseError,
    /// Method is not one of list / create / update / delete.
    MethodNotFound,
    /// Storage failure the caller cannot fix.
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn bad_param(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadParam, message)
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("method not found: '{}'", method),
        )
    }
}

/// Storage details are kept out of the message for `Internal`.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::InvalidModule(_) => ErrorCode::InvalidModule,
            CoreError::InvalidRecord(_) => ErrorCode::InvalidRecord,
            CoreError::RecordNotFound { .. } => ErrorCode::NotFound,
            CoreError::BadParam(_) => ErrorCode::BadParam,
            CoreError::Repository(_) => ErrorCode::Internal,
        };

        match err {
            CoreError::Repository(_) => ApiError::new(code, "storage failure"),
            other => ApiError::new(code, other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
