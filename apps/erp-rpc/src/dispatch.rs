//! # Request Dispatch
//!
//! Turns one JSON request envelope into one record usecase call.
//!
//! ## Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request                                                                │
//! │  { "jsonrpc": "2.0", "id": 7, "method": "create",                      │
//! │    "operator_id": 3,                                                    │
//! │    "params": { "module_key": "partners", "record": { ... } } }         │
//! │                                                                         │
//! │  method   params                        result                          │
//! │  ──────   ──────────────────────────    ─────────────────────────       │
//! │  list     module_key                    { "records": [view, ...] }      │
//! │  create   module_key, record            { "record": view }              │
//! │  update   module_key, id, record        { "record": view }              │
//! │  delete   module_key, id                { "deleted": true, "id": id }   │
//! │                                                                         │
//! │  Reply (success)                                                        │
//! │  { "jsonrpc": "2.0", "id": 7, "result": { ... } }                       │
//! │                                                                         │
//! │  Reply (failure)                                                        │
//! │  { "jsonrpc": "2.0", "id": 7, "error": "...", "code": "NOT_FOUND" }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The operator id comes from the envelope only. Any `created_by_admin_id`
//! style keys inside `record` are ordinary payload fields.

use std::str::FromStr;
use std::time::Instant;

use erp_core::RecordUsecase;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{ApiError, ErrorCode};

pub const JSONRPC_VERSION: &str = "2.0";

// =============================================================================
// Envelopes
// =============================================================================

/// One request line.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    /// Echoed back verbatim; `null` when absent.
    #[serde(default)]
    pub id: Value,

    pub method: String,

    #[serde(default)]
    pub params: Value,

    /// Acting administrator, if the caller is authenticated.
    #[serde(default)]
    pub operator_id: Option<i64>,
}

/// One reply line.
#[derive(Debug, Clone, Serialize)]
pub struct RpcReply {
    pub jsonrpc: &'static str,

    pub id: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl RpcReply {
    pub fn success(id: Value, result: Value) -> Self {
        RpcReply {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
            code: None,
        }
    }

    pub fn failure(id: Value, err: ApiError) -> Self {
        RpcReply {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(err.message),
            code: Some(err.code),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

// =============================================================================
// Methods & Params
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    List,
    Create,
    Update,
    Delete,
}

impl FromStr for Method {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "list" => Ok(Method::List),
            "create" => Ok(Method::Create),
            "update" => Ok(Method::Update),
            "delete" => Ok(Method::Delete),
            other => Err(ApiError::method_not_found(other)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RecordParams {
    #[serde(default)]
    module_key: String,

    #[serde(default)]
    id: Option<Value>,

    #[serde(default)]
    record: Option<Value>,
}

impl RecordParams {
    fn from_value(params: &Value) -> Result<Self, ApiError> {
        match params {
            Value::Null => Ok(RecordParams::default()),
            Value::Object(_) => serde_json::from_value(params.clone())
                .map_err(|e| ApiError::bad_param(format!("invalid params: {}", e))),
            _ => Err(ApiError::bad_param("params must be an object")),
        }
    }

    /// Integer or numeric string. A missing id becomes 0, which the usecase
    /// rejects after checking the module key.
    fn id(&self) -> Result<i64, ApiError> {
        match &self.id {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| ApiError::bad_param(format!("id must be an integer, got {}", n))),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| ApiError::bad_param(format!("id must be an integer, got '{}'", s))),
            Some(other) => Err(ApiError::bad_param(format!(
                "id must be an integer, got {}",
                other
            ))),
        }
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Routes requests to the record usecase.
#[derive(Clone)]
pub struct RpcHandler {
    usecase: RecordUsecase,
}

impl RpcHandler {
    pub fn new(usecase: RecordUsecase) -> Self {
        RpcHandler { usecase }
    }

    /// Parses and handles one request line. Unparsable lines get a
    /// `PARSE_ERROR` reply with a `null` id.
    pub async fn handle_line(&self, line: &str) -> RpcReply {
        match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(error = %e, "Unparsable request line");
                RpcReply::failure(
                    Value::Null,
                    ApiError::parse_error(format!("invalid request: {}", e)),
                )
            }
        }
    }

    /// Handles one request; never fails, errors become failure replies.
    pub async fn handle(&self, request: RpcRequest) -> RpcReply {
        let started = Instant::now();
        let outcome = self.dispatch(&request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                info!(method = %request.method, elapsed_ms, "Request completed");
                RpcReply::success(request.id, result)
            }
            Err(err) => {
                warn!(
                    method = %request.method,
                    code = ?err.code,
                    elapsed_ms,
                    error = %err.message,
                    "Request failed"
                );
                RpcReply::failure(request.id, err)
            }
        }
    }

    async fn dispatch(&self, request: &RpcRequest) -> Result<Value, ApiError> {
        let method: Method = request.method.parse()?;
        let params = RecordParams::from_value(&request.params)?;
        let operator = request.operator_id;

        match method {
            Method::List => {
                let records = self.usecase.list(&params.module_key).await?;
                Ok(json!({ "records": records }))
            }
            Method::Create => {
                let record = self
                    .usecase
                    .create(&params.module_key, params.record.as_ref(), operator)
                    .await?;
                Ok(json!({ "record": record }))
            }
            Method::Update => {
                let id = params.id()?;
                let record = self
                    .usecase
                    .update(&params.module_key, id, params.record.as_ref(), operator)
                    .await?;
                Ok(json!({ "record": record }))
            }
            Method::Delete => {
                let id = params.id()?;
                self.usecase.delete(&params.module_key, id).await?;
                Ok(json!({ "deleted": true, "id": id }))
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
