//! Directory-backed local object store.
//!
//! Each record is stored as two files named after the SHA-256 of its id:
//!
//! ```text
//! {root}/
//! ├── 9f86d081884c7d65....bin    (blob bytes)
//! └── 9f86d081884c7d65....json   (MediaRecord)
//! ```
//!
//! Both are written to a temporary file and renamed into place, and the blob
//! always lands before the record, so a record on disk always has its bytes.

mod handles;

pub use handles::BlobHandles;

use crate::{MediaBackend, StorageResult, UploadRequest};
use medialib_core::{ListOptions, MediaRecord, MediaUpdate, ProgressReporter, StorageProvider};
use medialib_error::{StorageError, StorageErrorKind};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const BLOB_EXTENSION: &str = "bin";
const RECORD_EXTENSION: &str = "json";

/// Durable local persistence of blobs plus their records.
///
/// URLs handed out are `blob:` handles registered in a [`BlobHandles`]
/// registry. Handles survive a restart: [`LocalObjectStore::open`] registers
/// the persisted handle of every record whose blob is still on disk.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    handles: BlobHandles,
}

impl LocalObjectStore {
    /// Open (or create) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the directory cannot be created or read.
    #[tracing::instrument(skip(root))]
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| io_error(&root, e))?;

        let store = Self {
            root,
            handles: BlobHandles::new(),
        };
        let records = store.load_records().await?;
        for record in &records {
            store.handles.register(record.url().clone(), record.id().clone());
        }

        tracing::info!(
            path = %store.root.display(),
            records = records.len(),
            "Opened local object store"
        );
        Ok(store)
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Live handle registry.
    pub fn handles(&self) -> &BlobHandles {
        &self.handles
    }

    fn key(id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(id.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn path_for(&self, id: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{}.{}", Self::key(id), extension))
    }

    /// Persist a blob and its record, replacing any record with the same id.
    ///
    /// A replaced record's handle is revoked once the new one is in place.
    #[tracing::instrument(skip(self, record, data), fields(id = %record.id(), size = data.len()))]
    pub async fn put(&self, record: &MediaRecord, data: &[u8]) -> StorageResult<()> {
        let superseded = match self.get(record.id()).await {
            Ok(previous) => Some(previous),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                tracing::warn!(error = %e, "Replacing unreadable record");
                None
            }
        };

        write_atomic(&self.path_for(record.id(), BLOB_EXTENSION), data).await?;
        self.write_record(record).await?;
        self.handles.register(record.url().clone(), record.id().clone());

        if let Some(previous) = superseded.filter(|p| p.url() != record.url()) {
            self.handles.revoke(previous.url());
            tracing::debug!(old_url = %previous.url(), "Superseded local blob");
        }

        tracing::info!(id = %record.id(), url = %record.url(), "Stored local blob");
        Ok(())
    }

    async fn write_record(&self, record: &MediaRecord) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(record).map_err(|e| {
            StorageError::new(StorageErrorKind::Corrupt(format!(
                "serialize {}: {}",
                record.id(),
                e
            )))
        })?;
        write_atomic(&self.path_for(record.id(), RECORD_EXTENSION), &json).await
    }

    /// Record with the given id.
    pub async fn get(&self, id: &str) -> StorageResult<MediaRecord> {
        read_record(&self.path_for(id, RECORD_EXTENSION)).await
    }

    /// Record behind a live handle.
    pub async fn get_by_url(&self, url: &str) -> StorageResult<MediaRecord> {
        let id = self.resolve(url)?;
        self.get(&id).await
    }

    fn resolve(&self, url: &str) -> StorageResult<String> {
        self.handles
            .resolve(url)
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(url.to_string())))
    }

    /// All records passing `options`, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn get_all(&self, options: &ListOptions) -> StorageResult<Vec<MediaRecord>> {
        let mut records: Vec<MediaRecord> = self
            .load_records()
            .await?
            .into_iter()
            .filter(|r| r.matches(options))
            .collect();
        records.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        if let Some(limit) = options.limit() {
            records.truncate(*limit);
        }
        Ok(records)
    }

    /// Every record whose blob is present. Unreadable records are skipped.
    async fn load_records(&self) -> StorageResult<Vec<MediaRecord>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| io_error(&self.root, e))?;

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.root, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            match read_record(&path).await {
                Ok(record) => {
                    let blob = path.with_extension(BLOB_EXTENSION);
                    if tokio::fs::try_exists(&blob).await.unwrap_or(false) {
                        records.push(record);
                    } else {
                        tracing::warn!(path = %path.display(), "Record without blob, skipping");
                    }
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable record"),
            }
        }
        Ok(records)
    }

    /// Apply an edit to a stored record.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: &MediaUpdate) -> StorageResult<MediaRecord> {
        let mut record = self.get(id).await?;
        if record.apply(update) {
            self.write_record(&record).await?;
            tracing::debug!(id, "Updated local record");
        }
        Ok(record)
    }

    /// Remove a record and its blob, then revoke its handle.
    ///
    /// # Errors
    ///
    /// `NotFound` when no record has this id.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> StorageResult<MediaRecord> {
        let record = self.get(id).await?;
        let record_path = self.path_for(id, RECORD_EXTENSION);
        tokio::fs::remove_file(&record_path)
            .await
            .map_err(|e| io_error(&record_path, e))?;

        let blob_path = self.path_for(id, BLOB_EXTENSION);
        match tokio::fs::remove_file(&blob_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %blob_path.display(), error = %e, "Orphaned local blob"),
        }

        self.handles.revoke(record.url());
        tracing::info!(id, url = %record.url(), "Deleted local blob");
        Ok(record)
    }

    /// Bytes behind a live handle.
    #[tracing::instrument(skip(self))]
    pub async fn read(&self, url: &str) -> StorageResult<Vec<u8>> {
        let id = self.resolve(url)?;
        let path = self.path_for(&id, BLOB_EXTENSION);
        tokio::fs::read(&path).await.map_err(|e| io_error(&path, e))
    }
}

#[async_trait::async_trait]
impl MediaBackend for LocalObjectStore {
    fn provider(&self) -> StorageProvider {
        StorageProvider::Local
    }

    fn ensure_available(&self) -> StorageResult<()> {
        Ok(())
    }

    #[tracing::instrument(skip(self, request, progress), fields(path = %request.storage_path()))]
    async fn upload(
        &self,
        request: &UploadRequest<'_>,
        progress: &ProgressReporter,
    ) -> StorageResult<MediaRecord> {
        progress.report(0);
        let storage_path = request.storage_path();
        let record = request.record(
            storage_path.clone(),
            BlobHandles::mint(),
            StorageProvider::Local,
            storage_path,
        )?;
        self.put(&record, request.blob().data()).await?;
        progress.report(50);
        Ok(record)
    }

    /// Only a live handle selects what gets removed. A revoked handle may name
    /// an id that a newer upload now occupies, so it is `NotFound`.
    async fn delete(&self, record: &MediaRecord) -> StorageResult<()> {
        let id = self.resolve(record.url())?;
        LocalObjectStore::delete(self, &id).await.map(|_| ())
    }
}

async fn write_atomic(path: &Path, data: &[u8]) -> StorageResult<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    tokio::fs::write(&temp, data)
        .await
        .map_err(|e| io_error(&temp, e))?;
    tokio::fs::rename(&temp, path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::Io(format!(
            "rename {} to {}: {}",
            temp.display(),
            path.display(),
            e
        )))
    })
}

async fn read_record(path: &Path) -> StorageResult<MediaRecord> {
    let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        StorageError::new(StorageErrorKind::Corrupt(format!("{}: {}", path.display(), e)))
    })
}

#[track_caller]
fn io_error(path: &Path, e: std::io::Error) -> StorageError {
    let message = format!("{}: {}", path.display(), e);
    if e.kind() == std::io::ErrorKind::NotFound {
        StorageError::new(StorageErrorKind::NotFound(message))
    } else {
        StorageError::new(StorageErrorKind::Io(message))
    }
}
