//! Storage backend trait definition.

use crate::StorageResult;
use chrono::{DateTime, Utc};
use medialib_core::{MediaBlob, MediaMetadata, MediaRecord, ProgressReporter, StorageProvider};

/// Everything a backend needs to store one blob.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    blob: &'a MediaBlob,
    folder: &'a str,
    file_name: &'a str,
    alt_text: Option<&'a str>,
    created_at: DateTime<Utc>,
}

impl<'a> UploadRequest<'a> {
    /// Describe an upload of `blob` to `folder/file_name`.
    pub fn new(
        blob: &'a MediaBlob,
        folder: &'a str,
        file_name: &'a str,
        alt_text: Option<&'a str>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            blob,
            folder,
            file_name,
            alt_text,
            created_at,
        }
    }

    /// Payload.
    pub fn blob(&self) -> &'a MediaBlob {
        self.blob
    }

    /// Destination folder.
    pub fn folder(&self) -> &'a str {
        self.folder
    }

    /// Stored filename.
    pub fn file_name(&self) -> &'a str {
        self.file_name
    }

    /// `folder/file_name`, the key used by every backend.
    pub fn storage_path(&self) -> String {
        format!("{}/{}", self.folder, self.file_name)
    }

    /// Build the ledger record for a blob stored at `url`.
    ///
    /// Backends call this once the transfer succeeded so the provider tag is
    /// always set by the backend that actually holds the bytes.
    pub fn record(
        &self,
        id: impl Into<String>,
        url: impl Into<String>,
        provider: StorageProvider,
        storage_path: impl Into<String>,
    ) -> StorageResult<MediaRecord> {
        let mut builder = MediaRecord::builder();
        builder
            .id(id)
            .filename(self.file_name)
            .url(url)
            .mime_type(self.blob.mime_type())
            .size_bytes(self.blob.size_bytes())
            .created_at(self.created_at)
            .metadata(MediaMetadata::new(provider, self.folder, storage_path));
        if let Some(alt_text) = self.alt_text {
            builder.alt_text(alt_text);
        }
        Ok(builder.build()?)
    }
}

/// A place blobs can physically live.
///
/// Implementations report progress checkpoints through the given reporter and
/// return the ledger record describing the stored blob. The router decides
/// what happens on failure; backends never fall back on their own.
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Which provider tag this backend writes.
    fn provider(&self) -> StorageProvider;

    /// Check credentials without touching the network.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error when required settings are missing.
    fn ensure_available(&self) -> StorageResult<()>;

    /// Store a blob and describe it.
    async fn upload(
        &self,
        request: &UploadRequest<'_>,
        progress: &ProgressReporter,
    ) -> StorageResult<MediaRecord>;

    /// Remove the blob a record points at.
    ///
    /// # Errors
    ///
    /// `NotFound` when the blob is already gone; callers may treat that as
    /// success.
    async fn delete(&self, record: &MediaRecord) -> StorageResult<()>;
}
