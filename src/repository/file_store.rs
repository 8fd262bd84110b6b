use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::model::StoredRecord;

use super::store::{RecordStore, StoreError};

/// One JSON file per tracked repository under `<root>/tracked/`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn open(root: &Path) -> Result<Self, StoreError> {
        let dir = root.join("tracked");
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// File holding the record for `key`
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl RecordStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        match fs::read(self.record_path(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, record: &StoredRecord) -> Result<(), StoreError> {
        let path = self.record_path(key);
        let tmp = path.with_extension("json.tmp");

        // Write then rename so readers never see a half-written record
        fs::write(&tmp, serde_json::to_vec_pretty(record)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(fs::try_exists(self.record_path(key)).await?)
    }

    async fn list(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let mut records: Vec<StoredRecord> = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let bytes = fs::read(&path).await?;
                records.push(serde_json::from_slice(&bytes)?);
            }
        }

        records.sort_by(|a, b| a.repo.cmp(&b.repo));
        Ok(records)
    }
}
