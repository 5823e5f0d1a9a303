//! # Module Record Repository
//!
//! SQLite storage for every document type.
//!
//! ## Row Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  module_records                                                         │
//! │                                                                         │
//! │  id │ module_key  │ code   │ box   │ payload (JSON text)    │ ...       │
//! │  ───┼─────────────┼────────┼───────┼────────────────────────┼────       │
//! │  7  │ quotations  │ Q-0007 │ 草稿箱 │ {"code":"Q-0007",...}  │           │
//! │  6  │ partners    │ CS-001 │ 免批   │ {"code":"CS-001",...}  │           │
//! │                                                                         │
//! │  code / box are copies of payload["code"] / payload["box"], kept in     │
//! │  columns for the (module_key, code) index. NULL when absent.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payloads arrive already validated; nothing here re-applies rules.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use erp_core::{payload_str, CoreResult, ModuleKey, ModuleRecord, Payload, RecordRepository};

use crate::error::{DbError, DbResult};

const RECORD_COLUMNS: &str = "id, module_key, code, box, payload, \
     created_by_admin_id, updated_by_admin_id, created_at, updated_at";

/// One `module_records` row as stored.
#[derive(Debug, FromRow)]
struct RecordRow {
    id: i64,
    module_key: String,
    code: Option<String>,
    #[sqlx(rename = "box")]
    box_name: Option<String>,
    payload: String,
    created_by_admin_id: Option<i64>,
    updated_by_admin_id: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<RecordRow> for ModuleRecord {
    type Error = DbError;

    fn try_from(row: RecordRow) -> DbResult<Self> {
        let module_key: ModuleKey = row.module_key.parse().map_err(|_| DbError::CorruptPayload {
            id: row.id,
            reason: format!("unknown module key '{}'", row.module_key),
        })?;

        let payload = if row.payload.trim().is_empty() {
            Payload::new()
        } else {
            serde_json::from_str::<Payload>(&row.payload).map_err(|e| DbError::CorruptPayload {
                id: row.id,
                reason: e.to_string(),
            })?
        };

        Ok(ModuleRecord {
            id: row.id,
            module_key,
            code: row.code,
            box_name: row.box_name,
            payload,
            created_by_admin_id: row.created_by_admin_id,
            updated_by_admin_id: row.updated_by_admin_id,
            created_at: from_epoch(row.id, row.created_at)?,
            updated_at: from_epoch(row.id, row.updated_at)?,
        })
    }
}

fn from_epoch(id: i64, secs: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| DbError::CorruptPayload {
        id,
        reason: format!("timestamp {secs} out of range"),
    })
}

fn encode_payload(payload: &Payload) -> DbResult<String> {
    serde_json::to_string(payload).map_err(|e| DbError::Internal(format!("payload encoding failed: {e}")))
}

/// Repository for module record database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.records();
/// let stored = repo.insert(ModuleKey::Partners, &payload, Some(1)).await?;
/// let partners = repo.list(ModuleKey::Partners).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqliteRecordRepository {
    pool: SqlitePool,
}

impl SqliteRecordRepository {
    /// Creates a new SqliteRecordRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteRecordRepository { pool }
    }

    /// Lists records of one document type, newest (highest id) first.
    pub async fn list(&self, module_key: ModuleKey) -> DbResult<Vec<ModuleRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM module_records WHERE module_key = ?1 ORDER BY id DESC"
        );
        let rows: Vec<RecordRow> = sqlx::query_as(&sql)
            .bind(module_key.as_str())
            .fetch_all(&self.pool)
            .await?;

        debug!(module_key = %module_key, count = rows.len(), "Listed records");
        rows.into_iter().map(ModuleRecord::try_from).collect()
    }

    /// Gets one record by `(id, module_key)`.
    pub async fn get(&self, module_key: ModuleKey, id: i64) -> DbResult<Option<ModuleRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM module_records WHERE id = ?1 AND module_key = ?2");
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(module_key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(ModuleRecord::try_from).transpose()
    }

    /// Inserts a new record.
    ///
    /// ## Arguments
    /// * `created_by` - stored as creator and last updater when positive
    pub async fn insert(
        &self,
        module_key: ModuleKey,
        payload: &Payload,
        created_by: Option<i64>,
    ) -> DbResult<ModuleRecord> {
        let operator = created_by.filter(|id| *id > 0);
        let now = Utc::now().timestamp();
        debug!(module_key = %module_key, code = ?payload_str(payload, "code"), "Inserting record");

        let sql = format!(
            r#"
            INSERT INTO module_records (
                module_key, code, box, payload,
                created_by_admin_id, updated_by_admin_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?6)
            RETURNING {RECORD_COLUMNS}
            "#
        );
        let row: RecordRow = sqlx::query_as(&sql)
            .bind(module_key.as_str())
            .bind(payload_str(payload, "code"))
            .bind(payload_str(payload, "box"))
            .bind(encode_payload(payload)?)
            .bind(operator)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        ModuleRecord::try_from(row)
    }

    /// Replaces the payload of `(id, module_key)`.
    ///
    /// `code` and `box` columns follow the new payload and are cleared when it
    /// no longer carries them. The updater is changed only when positive.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no row matches
    pub async fn replace(
        &self,
        module_key: ModuleKey,
        id: i64,
        payload: &Payload,
        updated_by: Option<i64>,
    ) -> DbResult<ModuleRecord> {
        let operator = updated_by.filter(|id| *id > 0);
        let now = Utc::now().timestamp();
        debug!(module_key = %module_key, id, "Updating record");

        let sql = format!(
            r#"
            UPDATE module_records SET
                code = ?3,
                box = ?4,
                payload = ?5,
                updated_by_admin_id = COALESCE(?6, updated_by_admin_id),
                updated_at = ?7
            WHERE id = ?1 AND module_key = ?2
            RETURNING {RECORD_COLUMNS}
            "#
        );
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(module_key.as_str())
            .bind(payload_str(payload, "code"))
            .bind(payload_str(payload, "box"))
            .bind(encode_payload(payload)?)
            .bind(operator)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => ModuleRecord::try_from(row),
            None => Err(DbError::not_found(module_key.as_str(), id)),
        }
    }

    /// Deletes `(id, module_key)`.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no row matches
    pub async fn remove(&self, module_key: ModuleKey, id: i64) -> DbResult<()> {
        debug!(module_key = %module_key, id, "Deleting record");

        let result = sqlx::query("DELETE FROM module_records WHERE id = ?1 AND module_key = ?2")
            .bind(id)
            .bind(module_key.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(module_key.as_str(), id));
        }
        Ok(())
    }

    /// Counts records of one document type.
    pub async fn count(&self, module_key: ModuleKey) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM module_records WHERE module_key = ?1")
            .bind(module_key.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl RecordRepository for SqliteRecordRepository {
    async fn list_by_module(&self, module_key: ModuleKey) -> CoreResult<Vec<ModuleRecord>> {
        Ok(self.list(module_key).await?)
    }

    async fn create(
        &self,
        module_key: ModuleKey,
        payload: Payload,
        created_by: Option<i64>,
    ) -> CoreResult<ModuleRecord> {
        Ok(self.insert(module_key, &payload, created_by).await?)
    }

    async fn update(
        &self,
        module_key: ModuleKey,
        id: i64,
        payload: Payload,
        updated_by: Option<i64>,
    ) -> CoreResult<ModuleRecord> {
        Ok(self.replace(module_key, id, &payload, updated_by).await?)
    }

    async fn delete(&self, module_key: ModuleKey, id: i64) -> CoreResult<()> {
        Ok(self.remove(module_key, id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use erp_core::{CoreError, RecordUsecase, RuleBook};
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn repo() -> (Database, SqliteRecordRepository) {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        let repo = db.records();
        (db, repo)
    }

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[tokio::test]
    async fn test_insert_extracts_code_and_box() {
        let (_db, repo) = repo().await;

        let stored = repo
            .insert(
                ModuleKey::Partners,
                &payload(json!({"code": "CS-001", "box": "免批", "name": "客户A"})),
                Some(3),
            )
            .await
            .unwrap();

        assert!(stored.id > 0);
        assert_eq!(stored.module_key, ModuleKey::Partners);
        assert_eq!(stored.code.as_deref(), Some("CS-001"));
        assert_eq!(stored.box_name.as_deref(), Some("免批"));
        assert_eq!(stored.payload["name"], json!("客户A"));
        assert_eq!(stored.created_by_admin_id, Some(3));
        assert_eq!(stored.updated_by_admin_id, Some(3));
    }

    #[tokio::test]
    async fn test_non_positive_operator_is_not_stored() {
        let (_db, repo) = repo().await;
        let stored = repo
            .insert(ModuleKey::Products, &payload(json!({"hsCode": "1"})), Some(0))
            .await
            .unwrap();
        assert_eq!(stored.created_by_admin_id, None);
        assert_eq!(stored.code, None);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_scoped_to_module() {
        let (_db, repo) = repo().await;
        let first = repo
            .insert(ModuleKey::Partners, &payload(json!({"n": 1})), None)
            .await
            .unwrap();
        let second = repo
            .insert(ModuleKey::Partners, &payload(json!({"n": 2})), None)
            .await
            .unwrap();
        repo.insert(ModuleKey::Products, &payload(json!({"n": 3})), None)
            .await
            .unwrap();

        let listed = repo.list(ModuleKey::Partners).await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(repo.count(ModuleKey::Products).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_clears_missing_code_and_keeps_creator() {
        let (_db, repo) = repo().await;
        let stored = repo
            .insert(
                ModuleKey::Quotations,
                &payload(json!({"code": "Q-1", "box": "草稿箱"})),
                Some(1),
            )
            .await
            .unwrap();

        let updated = repo
            .replace(
                ModuleKey::Quotations,
                stored.id,
                &payload(json!({"box": "待批箱", "currency": "EUR"})),
                Some(2),
            )
            .await
            .unwrap();
        assert_eq!(updated.code, None);
        assert_eq!(updated.box_name.as_deref(), Some("待批箱"));
        assert_eq!(updated.created_by_admin_id, Some(1));
        assert_eq!(updated.updated_by_admin_id, Some(2));
        assert!(!updated.payload.contains_key("code"));

        let unchanged_updater = repo
            .replace(ModuleKey::Quotations, stored.id, &payload(json!({})), None)
            .await
            .unwrap();
        assert_eq!(unchanged_updater.updated_by_admin_id, Some(2));
    }

    #[tokio::test]
    async fn test_not_found_is_scoped_by_module() {
        let (_db, repo) = repo().await;
        let stored = repo
            .insert(ModuleKey::Partners, &payload(json!({})), None)
            .await
            .unwrap();

        let err = repo
            .replace(ModuleKey::Products, stored.id, &payload(json!({})), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = repo.remove(ModuleKey::Products, stored.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        repo.remove(ModuleKey::Partners, stored.id).await.unwrap();
        assert!(repo.get(ModuleKey::Partners, stored.id).await.unwrap().is_none());
        assert!(matches!(
            repo.remove(ModuleKey::Partners, stored.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_payload_surfaces_as_invalid_record() {
        let (db, repo) = repo().await;
        sqlx::query("INSERT INTO module_records (module_key, payload) VALUES ('partners', '[1, 2]')")
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo.list(ModuleKey::Partners).await.unwrap_err();
        assert!(matches!(err, DbError::CorruptPayload { .. }));

        let core: CoreError = err.into();
        assert!(core.is_invalid_record());
    }

    #[tokio::test]
    async fn test_oversized_code_violates_constraint() {
        let (_db, repo) = repo().await;
        let long_code = "C".repeat(200);
        let err = repo
            .insert(ModuleKey::Partners, &payload(json!({"code": long_code})), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation { ref message } if message.contains("CHECK")));
    }

    #[tokio::test]
    async fn test_out_of_range_timestamp_is_corrupt() {
        let (db, repo) = repo().await;
        sqlx::query(
            "INSERT INTO module_records (module_key, payload, created_at) VALUES ('partners', '{}', ?1)",
        )
        .bind(i64::MAX)
        .execute(db.pool())
        .await
        .unwrap();

        let err = repo.list(ModuleKey::Partners).await.unwrap_err();
        assert!(matches!(err, DbError::CorruptPayload { ref reason, .. } if reason.contains("timestamp")));
    }

    #[tokio::test]
    async fn test_usecase_over_sqlite() {
        let (_db, repo) = repo().await;
        let uc = RecordUsecase::new(Arc::new(RuleBook::standard()), Arc::new(repo));

        let created = uc
            .create(
                "settlements",
                Some(&json!({
                    "code": "ST-1",
                    "invoiceNo": "INV-001",
                    "shipDate": "2026-02-10",
                    "paymentCycleDays": 30,
                    "amount": 8000
                })),
                Some(1),
            )
            .await
            .unwrap();
        assert_eq!(created["receivableDate"], json!("2026-03-12"));
        assert_eq!(created["code"], json!("ST-1"));
        assert_eq!(created["box"], json!("免批"));
        let id = created["id"].as_i64().unwrap();

        let listed = uc.list("settlements").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], json!(id));

        let err = uc.delete("partners", id).await.unwrap_err();
        assert!(matches!(err, CoreError::RecordNotFound { .. }));
        uc.delete("settlements", id).await.unwrap();
    }
}
