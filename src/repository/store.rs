//! Record store trait for persistence abstraction
//!
//! Decouples the tracking lifecycle from where records are kept.

use sha2::{Digest, Sha512};
use thiserror::Error;

use crate::model::StoredRecord;

use super::database::Database;
use super::file_store::FileStore;

/// Errors raised by a record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed tracked record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("record store schema version {found} does not match {expected}")]
    SchemaMismatch { found: String, expected: &'static str },
}

/// Storage key for a repository identity: hex SHA-512 of the name
///
/// Two records for the same identity land on the same key; that collision is
/// how "already tracked" is detected.
pub fn hash_name(name: &str) -> String {
    hex::encode(Sha512::digest(name.as_bytes()))
}

/// Persistence layer for tracking records
///
/// Each record is written whole under its key; there are no partial updates.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Storage key for a repository identity
    fn key_for(&self, name: &str) -> String {
        hash_name(name)
    }

    /// Fetch the record stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StoreError>;

    /// Replace whatever is stored under `key`
    async fn put(&self, key: &str, record: &StoredRecord) -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Every tracked record
    async fn list(&self) -> Result<Vec<StoredRecord>, StoreError>;
}

/// A record store chosen at runtime
#[derive(Debug)]
pub enum Store {
    File(FileStore),
    Sqlite(Database),
}

impl RecordStore for Store {
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        match self {
            Store::File(store) => store.get(key).await,
            Store::Sqlite(store) => store.get(key).await,
        }
    }

    async fn put(&self, key: &str, record: &StoredRecord) -> Result<(), StoreError> {
        match self {
            Store::File(store) => store.put(key, record).await,
            Store::Sqlite(store) => store.put(key, record).await,
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self {
            Store::File(store) => store.exists(key).await,
            Store::Sqlite(store) => store.exists(key).await,
        }
    }

    async fn list(&self) -> Result<Vec<StoredRecord>, StoreError> {
        match self {
            Store::File(store) => store.list().await,
            Store::Sqlite(store) => store.list().await,
        }
    }
}
