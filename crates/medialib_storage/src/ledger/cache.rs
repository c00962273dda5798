//! Persisted key-value snapshot of the local ledger.

use crate::StorageResult;
use medialib_core::{MediaRecord, MediaUpdate};
use medialib_error::{StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Every known record, held in memory and mirrored to one JSON file.
///
/// Each change is applied to a copy, written through a temporary file and
/// renamed over the snapshot, and only then becomes visible. A failed write
/// leaves both the file and the in-memory view untouched.
///
/// Entries are unique by id and by url: inserting a record evicts anything
/// sharing either key.
#[derive(Debug)]
pub struct LedgerCache {
    path: PathBuf,
    entries: RwLock<Vec<MediaRecord>>,
}

impl LedgerCache {
    /// Load the snapshot at `path`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// `Corrupt` when the file exists but cannot be decoded.
    #[tracing::instrument(skip(path))]
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StorageError::new(StorageErrorKind::Corrupt(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::Io(format!(
                    "{}: {}",
                    path.display(),
                    e
                ))));
            }
        };
        tracing::debug!(entries = entries.len(), "Loaded ledger snapshot");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Snapshot file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &[MediaRecord]) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(entries).map_err(|e| {
            StorageError::new(StorageErrorKind::LedgerWrite(format!("serialize: {}", e)))
        })?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ledger_write(parent, e))?;
        }
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| ledger_write(&temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| ledger_write(&self.path, e))
    }

    /// Insert or replace a record. Returns the entries it evicted.
    pub async fn upsert(&self, record: MediaRecord) -> StorageResult<Vec<MediaRecord>> {
        let mut entries = self.entries.write().await;
        let (evicted, mut next): (Vec<_>, Vec<_>) = entries
            .iter()
            .cloned()
            .partition(|e| e.id() == record.id() || e.url() == record.url());
        next.push(record);
        self.persist(&next).await?;
        *entries = next;
        Ok(evicted)
    }

    /// Remove the record stored under `url`.
    pub async fn remove(&self, url: &str) -> StorageResult<Option<MediaRecord>> {
        let mut entries = self.entries.write().await;
        let Some(index) = entries.iter().position(|e| e.url() == url) else {
            return Ok(None);
        };
        let mut next = entries.clone();
        let removed = next.remove(index);
        self.persist(&next).await?;
        *entries = next;
        Ok(Some(removed))
    }

    /// Apply an edit to the record with `id`.
    ///
    /// # Errors
    ///
    /// `NotFound` when no entry has this id.
    pub async fn update(&self, id: &str, update: &MediaUpdate) -> StorageResult<MediaRecord> {
        let mut entries = self.entries.write().await;
        let index = entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(id.to_string())))?;
        let mut next = entries.clone();
        if next[index].apply(update) {
            self.persist(&next).await?;
            *entries = next;
        }
        Ok(entries[index].clone())
    }

    /// Entry with this id.
    pub async fn find_by_id(&self, id: &str) -> Option<MediaRecord> {
        self.entries.read().await.iter().find(|e| e.id() == id).cloned()
    }

    /// Entry with this url.
    pub async fn find_by_url(&self, url: &str) -> Option<MediaRecord> {
        self.entries.read().await.iter().find(|e| e.url() == url).cloned()
    }

    /// Copy of every entry.
    pub async fn snapshot(&self) -> Vec<MediaRecord> {
        self.entries.read().await.clone()
    }
}

#[track_caller]
fn ledger_write(path: &Path, e: std::io::Error) -> StorageError {
    StorageError::new(StorageErrorKind::LedgerWrite(format!(
        "{}: {}",
        path.display(),
        e
    )))
}
