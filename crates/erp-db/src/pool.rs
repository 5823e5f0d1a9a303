//! # Database Handle
//!
//! Opens the SQLite pool that backs the record repository.
//!
//! ## Opening Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database::open(config)                             │
//! │                                                                         │
//! │  DbLocation::File(path)            DbLocation::Memory                  │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  WAL journal, NORMAL sync,         private database per pool,          │
//! │  foreign keys, create file         foreign keys, single connection     │
//! │       │                                  │                              │
//! │       └───────────────┬──────────────────┘                              │
//! │                       ▼                                                 │
//! │            SqlitePool (pool_size connections)                           │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │            embedded migrations (unless disabled)                        │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │   db.records() ──► SqliteRecordRepository ──► RecordUsecase             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations::{self, MigrationStatus};
use crate::repository::record::SqliteRecordRepository;

/// Path spelling that selects an in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// A database file, created on first open.
    File(PathBuf),
    /// A private in-memory database, gone when the pool closes.
    Memory,
}

impl DbLocation {
    /// `":memory:"` selects [`DbLocation::Memory`]; anything else is a file.
    pub fn parse(path: &str) -> Self {
        if path.trim() == IN_MEMORY_PATH {
            DbLocation::Memory
        } else {
            DbLocation::File(PathBuf::from(path))
        }
    }
}

impl std::fmt::Display for DbLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbLocation::File(path) => write!(f, "{}", path.display()),
            DbLocation::Memory => f.write_str(IN_MEMORY_PATH),
        }
    }
}

/// Pool settings.
///
/// ## Example
/// ```rust
/// use erp_db::{DbConfig, DbLocation};
///
/// let config = DbConfig::from_path("./data/erp.db").pool_size(8).migrate(false);
/// assert_eq!(config.pool_size, 8);
/// assert!(matches!(config.location, DbLocation::File(_)));
/// assert_eq!(DbConfig::from_path(":memory:").location, DbLocation::Memory);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,

    /// Upper bound on open connections. Default: 5
    pub pool_size: u32,

    /// How long a caller waits for a free connection. Default: 30 seconds
    pub acquire_timeout: Duration,

    /// Idle connections are closed after this. Default: 10 minutes
    pub idle_timeout: Duration,

    /// Apply embedded migrations on open. Default: true
    pub migrate: bool,
}

impl DbConfig {
    /// File-backed configuration.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            pool_size: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            migrate: true,
        }
    }

    /// In-memory configuration for tests. Every pool opened from it is
    /// isolated from every other.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            // A second connection would see a different, empty database
            pool_size: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            migrate: true,
        }
    }

    /// File or memory depending on the spelling of `path`.
    pub fn from_path(path: &str) -> Self {
        match DbLocation::parse(path) {
            DbLocation::Memory => Self::in_memory(),
            DbLocation::File(file) => Self::file(file),
        }
    }

    /// Ignored for in-memory databases, which always use one connection.
    pub fn pool_size(mut self, size: u32) -> Self {
        if self.location != DbLocation::Memory {
            self.pool_size = size.max(1);
        }
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn migrate(mut self, migrate: bool) -> Self {
        self.migrate = migrate;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                // NORMAL under WAL: durable except for the last commit on power loss
                .synchronous(SqliteSynchronous::Normal),
        };
        Ok(options.foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the record store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let db = Database::open(DbConfig::file("./erp.db")).await?;
    /// let partners = db.records().list_by_module(ModuleKey::Partners).await?;
    /// ```
    pub async fn open(config: DbConfig) -> DbResult<Self> {
        info!(location = %config.location, "Opening record database");

        let options = config.connect_options()?;
        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(pool_size = config.pool_size, "Pool ready");

        let db = Database { pool };
        if config.migrate {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    /// Applies pending migrations. Safe to call repeatedly.
    pub async fn migrate(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub async fn migration_status(&self) -> DbResult<MigrationStatus> {
        migrations::migration_status(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Repository over this pool.
    pub fn records(&self) -> SqliteRecordRepository {
        SqliteRecordRepository::new(self.pool.clone())
    }

    /// True when a trivial query succeeds and no migration is pending.
    pub async fn is_healthy(&self) -> bool {
        let reachable = sqlx::query("SELECT 1").execute(&self.pool).await.is_ok();
        if !reachable {
            return false;
        }
        matches!(self.migration_status().await, Ok(status) if status.is_current())
    }

    /// Waits for checked-out connections to return, then closes the pool.
    /// Later repository calls fail with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing record database");
        self.pool.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_is_migrated() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        assert!(db.is_healthy().await);

        let status = db.migration_status().await.unwrap();
        assert!(status.total >= 1);
        assert!(status.is_current());
    }

    #[tokio::test]
    async fn test_unmigrated_database_is_unhealthy() {
        let db = Database::open(DbConfig::in_memory().migrate(false)).await.unwrap();
        assert!(!db.is_healthy().await);

        db.migrate().await.unwrap();
        assert!(db.is_healthy().await);
    }

    #[tokio::test]
    async fn test_memory_pools_do_not_share_rows() {
        let first = Database::open(DbConfig::in_memory()).await.unwrap();
        let second = Database::open(DbConfig::in_memory()).await.unwrap();

        sqlx::query("INSERT INTO module_records (module_key, payload) VALUES ('inventory', '{}')")
            .execute(first.pool())
            .await
            .unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM module_records")
            .fetch_one(second.pool())
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_closed_database_is_unhealthy() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.is_healthy().await);
    }

    #[test]
    fn test_location_parsing() {
        assert_eq!(DbLocation::parse(" :memory: "), DbLocation::Memory);
        assert_eq!(
            DbLocation::parse("/srv/erp.db"),
            DbLocation::File(PathBuf::from("/srv/erp.db"))
        );
        assert_eq!(DbLocation::Memory.to_string(), IN_MEMORY_PATH);
    }

    #[test]
    fn test_memory_pool_stays_single_connection() {
        assert_eq!(DbConfig::in_memory().pool_size(16).pool_size, 1);
        assert_eq!(DbConfig::file("erp.db").pool_size(16).pool_size, 16);
        assert_eq!(DbConfig::file("erp.db").pool_size(0).pool_size, 1);
    }
}
