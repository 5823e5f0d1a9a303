//! # Record Usecase
//!
//! The four operations the transport calls. Each one resolves the document
//! type, cleans the caller payload, runs the rule engine, and makes exactly
//! one repository call.
//!
//! ## Create / Update Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(" partners ", Some(&raw), Some(7))                               │
//! │       │                                                                 │
//! │       ├── resolve key          " partners " → ModuleKey::Partners       │
//! │       ├── normalize_payload    serialize, trim keys, drop reserved keys │
//! │       ├── apply rules          box / derive / required / numeric        │
//! │       ├── repository.create    one call, no retry                       │
//! │       │                                                                 │
//! │       └── record.to_view()  ──► caller                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors are returned untouched; nothing here logs or swallows them.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::repository::RecordRepository;
use crate::rules::RuleBook;
use crate::types::{ModuleKey, Payload, RecordView, RESERVED_KEYS};
use crate::validation::apply_module_rules;

/// Record operations over a rule book and a repository.
///
/// Cheap to clone; both halves are shared.
#[derive(Clone)]
pub struct RecordUsecase {
    rules: Arc<RuleBook>,
    repo: Arc<dyn RecordRepository>,
}

impl RecordUsecase {
    pub fn new(rules: Arc<RuleBook>, repo: Arc<dyn RecordRepository>) -> Self {
        RecordUsecase { rules, repo }
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Views of every record of one document type, most recent first.
    pub async fn list(&self, module_key: &str) -> CoreResult<Vec<RecordView>> {
        let key = self.rules.resolve(module_key)?;
        let records = self.repo.list_by_module(key).await?;
        Ok(records.iter().map(|r| r.to_view()).collect())
    }

    /// Validates and stores a new record.
    ///
    /// `operator` is recorded only when positive.
    ///
    /// ## Errors
    /// - `InvalidModule` for an unknown key
    /// - `InvalidRecord` when `payload` is `None`, does not serialize to a
    ///   JSON object, or fails the module rules
    pub async fn create<P>(
        &self,
        module_key: &str,
        payload: Option<&P>,
        operator: Option<i64>,
    ) -> CoreResult<RecordView>
    where
        P: Serialize + ?Sized,
    {
        let key = self.rules.resolve(module_key)?;
        let clean = self.validate(key, payload)?;

        let record = self
            .repo
            .create(key, clean, positive_operator(operator))
            .await?;
        Ok(record.to_view())
    }

    /// Validates and replaces the payload of an existing record.
    ///
    /// ## Errors
    /// Same as [`RecordUsecase::create`], plus `BadParam` for `id <= 0` and
    /// `RecordNotFound` when `(id, module_key)` does not exist.
    pub async fn update<P>(
        &self,
        module_key: &str,
        id: i64,
        payload: Option<&P>,
        operator: Option<i64>,
    ) -> CoreResult<RecordView>
    where
        P: Serialize + ?Sized,
    {
        let key = self.rules.resolve(module_key)?;
        check_id(id)?;
        let clean = self.validate(key, payload)?;

        let record = self
            .repo
            .update(key, id, clean, positive_operator(operator))
            .await?;
        Ok(record.to_view())
    }

    /// Deletes a record. No validation beyond the key and id.
    pub async fn delete(&self, module_key: &str, id: i64) -> CoreResult<()> {
        let key = self.rules.resolve(module_key)?;
        check_id(id)?;
        self.repo.delete(key, id).await
    }

    fn validate<P>(&self, key: ModuleKey, payload: Option<&P>) -> CoreResult<Payload>
    where
        P: Serialize + ?Sized,
    {
        let payload = payload.ok_or_else(|| {
            ValidationError::MalformedPayload("record is required".to_string())
        })?;
        let clean = normalize_payload(payload)?;
        apply_module_rules(&self.rules, key, &clean)
    }
}

// =============================================================================
// Payload Hygiene
// =============================================================================

/// Converts any serializable payload into a clean JSON object.
///
/// ## Rules
/// - serialization failure or a non-object → `MalformedPayload`
/// - keys are trimmed; blank keys are dropped
/// - server-managed keys (`id`, `module_key`, `created_at`, `updated_at`)
///   are dropped
///
/// ## Example
/// ```rust
/// use erp_core::usecase::normalize_payload;
/// use serde_json::json;
///
/// let clean = normalize_payload(&json!({" name ": "A", "id": 9, "  ": 1})).unwrap();
/// assert_eq!(clean.len(), 1);
/// assert_eq!(clean["name"], json!("A"));
/// ```
pub fn normalize_payload<P: Serialize + ?Sized>(payload: &P) -> Result<Payload, ValidationError> {
    let raw = serde_json::to_value(payload)
        .map_err(|e| ValidationError::MalformedPayload(e.to_string()))?;

    let map = match raw {
        Value::Object(map) => map,
        other => {
            return Err(ValidationError::MalformedPayload(format!(
                "record must be an object, got {}",
                json_kind(&other)
            )))
        }
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, value)| {
            let key = key.trim();
            if key.is_empty() || RESERVED_KEYS.contains(&key) {
                None
            } else {
                Some((key.to_string(), value))
            }
        })
        .collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn check_id(id: i64) -> CoreResult<()> {
    if id <= 0 {
        return Err(CoreError::BadParam(format!("id must be positive, got {id}")));
    }
    Ok(())
}

fn positive_operator(operator: Option<i64>) -> Option<i64> {
    operator.filter(|id| *id > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{payload_str, ModuleRecord};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory repository: newest first, ids shared across modules.
    #[derive(Default)]
    struct MemRepo {
        inner: Mutex<MemState>,
    }

    #[derive(Default)]
    struct MemState {
        last_id: i64,
        rows: HashMap<ModuleKey, Vec<ModuleRecord>>,
    }

    #[async_trait]
    impl RecordRepository for MemRepo {
        async fn list_by_module(&self, module_key: ModuleKey) -> CoreResult<Vec<ModuleRecord>> {
            let state = self.inner.lock().unwrap();
            Ok(state.rows.get(&module_key).cloned().unwrap_or_default())
        }

        async fn create(
            &self,
            module_key: ModuleKey,
            payload: Payload,
            created_by: Option<i64>,
        ) -> CoreResult<ModuleRecord> {
            let mut state = self.inner.lock().unwrap();
            state.last_id += 1;
            let now = Utc::now();
            let record = ModuleRecord {
                id: state.last_id,
                module_key,
                code: payload_str(&payload, "code").map(str::to_string),
                box_name: payload_str(&payload, "box").map(str::to_string),
                payload,
                created_by_admin_id: created_by,
                updated_by_admin_id: created_by,
                created_at: now,
                updated_at: now,
            };
            state
                .rows
                .entry(module_key)
                .or_default()
                .insert(0, record.clone());
            Ok(record)
        }

        async fn update(
            &self,
            module_key: ModuleKey,
            id: i64,
            payload: Payload,
            updated_by: Option<i64>,
        ) -> CoreResult<ModuleRecord> {
            let mut state = self.inner.lock().unwrap();
            let record = state
                .rows
                .get_mut(&module_key)
                .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
                .ok_or_else(|| CoreError::not_found(module_key.as_str(), id))?;

            record.code = payload_str(&payload, "code").map(str::to_string);
            record.box_name = payload_str(&payload, "box").map(str::to_string);
            record.payload = payload;
            record.updated_at = Utc::now();
            if updated_by.is_some() {
                record.updated_by_admin_id = updated_by;
            }
            Ok(record.clone())
        }

        async fn delete(&self, module_key: ModuleKey, id: i64) -> CoreResult<()> {
            let mut state = self.inner.lock().unwrap();
            let rows = state.rows.entry(module_key).or_default();
            let before = rows.len();
            rows.retain(|r| r.id != id);
            if rows.len() == before {
                return Err(CoreError::not_found(module_key.as_str(), id));
            }
            Ok(())
        }
    }

    fn usecase() -> (RecordUsecase, Arc<MemRepo>) {
        let repo = Arc::new(MemRepo::default());
        let uc = RecordUsecase::new(Arc::new(RuleBook::standard()), repo.clone());
        (uc, repo)
    }

    fn partner(name: &str, cycle: i64, box_name: &str) -> Value {
        json!({
            "code": "CS-001",
            "partnerType": "合作客户",
            "name": name,
            "address": "浙江杭州",
            "contact": "张三",
            "contactPhone": "13800001111",
            "paymentCycleDays": cycle,
            "box": box_name
        })
    }

    #[tokio::test]
    async fn test_crud_round_trip() {
        let (uc, _) = usecase();

        let created = uc
            .create("partners", Some(&partner("客户A", 30, "免批")), Some(1))
            .await
            .unwrap();
        assert_eq!(created["code"], json!("CS-001"));
        assert_eq!(created["module_key"], json!("partners"));
        let id = created["id"].as_i64().unwrap();

        let listed = uc.list("partners").await.unwrap();
        assert_eq!(listed.len(), 1);

        let updated = uc
            .update("partners", id, Some(&partner("客户A-更新", 45, "草稿箱")), Some(2))
            .await
            .unwrap();
        assert_eq!(updated["name"], json!("客户A-更新"));
        assert_eq!(updated["box"], json!("草稿箱"));
        assert_eq!(updated["paymentCycleDays"], json!(45));

        uc.delete("partners", id).await.unwrap();
        assert!(uc.list("partners").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let (uc, _) = usecase();

        assert!(matches!(uc.list("").await, Err(CoreError::InvalidModule(_))));
        assert!(matches!(
            uc.list("unknown_module").await,
            Err(CoreError::InvalidModule(_))
        ));

        let missing: Option<&Value> = None;
        let err = uc.create("partners", missing, Some(1)).await.unwrap_err();
        assert!(err.is_invalid_record());

        let err = uc
            .create("partners", Some(&json!(["not", "an", "object"])), Some(1))
            .await
            .unwrap_err();
        assert!(err.is_invalid_record());

        for id in [0, -3] {
            assert!(matches!(
                uc.update("partners", id, Some(&partner("A", 1, "免批")), None)
                    .await,
                Err(CoreError::BadParam(_))
            ));
            assert!(matches!(
                uc.delete("partners", id).await,
                Err(CoreError::BadParam(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_module_key_checked_before_id() {
        let (uc, _) = usecase();
        assert!(matches!(
            uc.delete("nope", 0).await,
            Err(CoreError::InvalidModule(_))
        ));
    }

    #[tokio::test]
    async fn test_not_found_is_distinct() {
        let (uc, _) = usecase();
        let created = uc
            .create("partners", Some(&partner("A", 30, "免批")), None)
            .await
            .unwrap();
        let id = created["id"].as_i64().unwrap();

        // Same id, other document type
        assert!(matches!(
            uc.delete("products", id).await,
            Err(CoreError::RecordNotFound { .. })
        ));
        assert!(matches!(
            uc.update("partners", id + 100, Some(&partner("A", 30, "免批")), None)
                .await,
            Err(CoreError::RecordNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_derived_fields_reach_the_view() {
        let (uc, _) = usecase();

        let settlement = uc
            .create(
                "settlements",
                Some(&json!({
                    "invoiceNo": "INV-001",
                    "shipDate": "2026-02-10",
                    "paymentCycleDays": 30,
                    "amount": 8000
                })),
                Some(1),
            )
            .await
            .unwrap();
        assert_eq!(settlement["receivableDate"], json!("2026-03-12"));

        let quotation = uc
            .create(
                "quotations",
                Some(&json!({
                    "customerName": "客户A",
                    "quotedDate": "2026-02-10",
                    "currency": "USD",
                    "totalAmount": 1,
                    "items": [
                        {"quantity": 2, "unitPrice": 5},
                        {"quantity": 3, "unitPrice": 10}
                    ]
                })),
                Some(1),
            )
            .await
            .unwrap();
        assert_eq!(quotation["totalAmount"], json!(40));
        assert_eq!(quotation["box"], json!("草稿箱"));
    }

    #[tokio::test]
    async fn test_reserved_keys_and_operator_ids() {
        let (uc, repo) = usecase();

        let mut raw = partner("A", 30, "免批");
        raw.as_object_mut().unwrap().remove("contact");
        raw["id"] = json!(999);
        raw["module_key"] = json!("products");
        raw["created_at"] = json!(0);
        raw[" contact "] = json!("李四");

        let created = uc.create("partners", Some(&raw), Some(0)).await.unwrap();
        assert_ne!(created["id"], json!(999));
        assert_eq!(created["module_key"], json!("partners"));
        assert_eq!(created["contact"], json!("李四"));

        let stored = repo.list_by_module(ModuleKey::Partners).await.unwrap();
        assert!(!stored[0].payload.contains_key("id"));
        assert!(!stored[0].payload.contains_key("module_key"));
        assert_eq!(stored[0].created_by_admin_id, None);
    }

    #[tokio::test]
    async fn test_typed_payloads_are_accepted() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Product<'a> {
            hs_code: &'a str,
            spec_code: &'a str,
            cn_desc: &'a str,
            en_desc: &'a str,
        }

        let (uc, _) = usecase();
        let view = uc
            .create(
                "products",
                Some(&Product {
                    hs_code: "7318.15",
                    spec_code: "M8x30",
                    cn_desc: "螺栓",
                    en_desc: "Bolt",
                }),
                None,
            )
            .await
            .unwrap();
        assert_eq!(view["hsCode"], json!("7318.15"));
        assert_eq!(view["box"], json!("免批"));
    }

    #[tokio::test]
    async fn test_unserializable_payload_is_invalid_record() {
        let (uc, repo) = usecase();
        // Tuple keys have no JSON object form
        let mut grid: HashMap<(i32, i32), i32> = HashMap::new();
        grid.insert((1, 2), 3);

        let err = uc.create("products", Some(&grid), None).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidRecord(ValidationError::MalformedPayload(_))
        ));

        let err = uc.update("products", 1, Some(&grid), None).await.unwrap_err();
        assert!(err.is_invalid_record());

        assert!(repo.list_by_module(ModuleKey::Products).await.unwrap().is_empty());
    }

    #[test]
    fn test_normalize_payload_rules() {
        let clean = normalize_payload(&json!({
            " a ": 1,
            "": 2,
            "   ": 3,
            "id": 4,
            "updated_at": 5,
            "b": {"id": 6}
        }))
        .unwrap();
        assert_eq!(clean.len(), 2);
        assert_eq!(clean["a"], json!(1));
        // Only top-level keys are cleaned
        assert_eq!(clean["b"], json!({"id": 6}));

        assert!(normalize_payload(&json!("text")).is_err());
        assert!(normalize_payload(&Value::Null).is_err());
    }
}
