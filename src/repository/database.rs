use sqlx::{
    Pool, Row, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::model::StoredRecord;

use super::SCHEMA_VERSION;
use super::store::{RecordStore, StoreError};

/// SQLite-backed record store, one row per tracked repository
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self, StoreError> {
        // Configure connection options with PRAGMAs applied to every connection
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", db_path))?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Open (creating if needed) `<root>/tracked.db` with its schema in place
    pub async fn open(root: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(root).await?;
        let db_path = root.join("tracked.db");
        let db = Self::new(&db_path.to_string_lossy()).await?;
        db.init_schema().await?;
        Ok(db)
    }

    /// Initialize database schema, returns true if it was created
    pub async fn init_schema(&self) -> Result<bool, StoreError> {
        // Create metadata table first (needed to check version)
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        let stored_version = self.get_metadata("schema_version").await?;
        match stored_version.as_deref() {
            Some(SCHEMA_VERSION) => return Ok(false),
            // Tracked records are not a cache; never drop them on a mismatch
            Some(other) => {
                return Err(StoreError::SchemaMismatch {
                    found: other.to_string(),
                    expected: SCHEMA_VERSION,
                });
            }
            None => {}
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tracked_repos (
                key TEXT PRIMARY KEY,
                repo TEXT NOT NULL,
                record TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        self.set_metadata("schema_version", SCHEMA_VERSION).await?;
        debug!(version = SCHEMA_VERSION, "Created tracked repository schema");
        Ok(true)
    }

    /// Get metadata value by key
    pub async fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("value")))
    }

    /// Set metadata value
    pub async fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO metadata (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl RecordStore for Database {
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        let row = sqlx::query("SELECT record FROM tracked_repos WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let json: String = row.get("record");
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, record: &StoredRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        sqlx::query("INSERT OR REPLACE INTO tracked_repos (key, repo, record) VALUES (?, ?, ?)")
            .bind(key)
            .bind(&record.repo)
            .bind(json)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM tracked_repos WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn list(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = sqlx::query("SELECT record FROM tracked_repos ORDER BY repo")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let json: String = row.get("record");
                serde_json::from_str(&json).map_err(StoreError::from)
            })
            .collect()
    }
}
