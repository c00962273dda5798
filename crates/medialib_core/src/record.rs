//! Media ledger record types.

use crate::{ListOptions, MediaUpdate, StorageProvider};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use medialib_error::BuilderError;
use serde::{Deserialize, Serialize};

/// URL scheme of process-local blob handles issued by the local backend.
pub const LOCAL_URL_SCHEME: &str = "blob:";

/// Where a record's blob lives and how it is grouped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    /// Backend holding the blob
    storage_provider: StorageProvider,
    /// Logical grouping label (e.g. `uploads`, `operator-logos`)
    folder: String,
    /// Backend-specific key of the blob
    storage_path: String,
}

impl MediaMetadata {
    /// Create metadata for a blob stored under `storage_path` on `provider`.
    pub fn new(
        storage_provider: StorageProvider,
        folder: impl Into<String>,
        storage_path: impl Into<String>,
    ) -> Self {
        Self {
            storage_provider,
            folder: folder.into(),
            storage_path: storage_path.into(),
        }
    }
}

/// Canonical descriptor of one uploaded asset.
///
/// `url` is the natural key used for de-duplication across ledgers. Edits
/// through [`MediaRecord::apply`] never touch `url`, `created_at` or the
/// storage provider.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use medialib_core::{MediaMetadata, MediaRecord, StorageProvider};
///
/// let record = MediaRecord::builder()
///     .id("uploads/logo.png")
///     .filename("logo.png")
///     .url("blob:medialib/5b1c")
///     .mime_type("image/png")
///     .size_bytes(2048u64)
///     .created_at(Utc::now())
///     .metadata(MediaMetadata::new(StorageProvider::Local, "uploads", "uploads/logo.png"))
///     .build()
///     .unwrap();
///
/// assert!(record.is_local());
/// assert_eq!(record.alt_text(), "logo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into), build_fn(error = "BuilderError", name = "build_internal", private))]
pub struct MediaRecord {
    /// Unique identifier
    id: String,
    /// Display name
    filename: String,
    /// Dereferenceable location of the blob
    url: String,
    /// MIME type, e.g. `image/png`
    mime_type: String,
    /// Payload size in bytes
    size_bytes: u64,
    /// Upload time
    created_at: DateTime<Utc>,
    /// Alternative text, defaults to the filename stem
    #[builder(default)]
    #[serde(default)]
    alt_text: String,
    /// Storage location and grouping
    metadata: MediaMetadata,
}

impl MediaRecord {
    /// Creates a new record builder.
    pub fn builder() -> MediaRecordBuilder {
        MediaRecordBuilder::default()
    }

    /// Storage provider shortcut.
    pub fn provider(&self) -> StorageProvider {
        self.metadata.storage_provider
    }

    /// Folder shortcut.
    pub fn folder(&self) -> &str {
        &self.metadata.folder
    }

    /// True when the blob is held by the local backend.
    pub fn is_local(&self) -> bool {
        self.metadata.storage_provider == StorageProvider::Local
            || Self::is_local_url(&self.url)
    }

    /// True for process-local blob handles.
    pub fn is_local_url(url: &str) -> bool {
        url.starts_with(LOCAL_URL_SCHEME)
    }

    /// Filename without its final extension.
    pub fn filename_stem(filename: &str) -> &str {
        match filename.rfind('.') {
            Some(0) | None => filename,
            Some(idx) => &filename[..idx],
        }
    }

    /// Whether this record passes the folder and type filters of a listing.
    pub fn matches(&self, options: &ListOptions) -> bool {
        let folder_ok = options
            .folder()
            .as_ref()
            .is_none_or(|folder| self.metadata.folder == *folder);
        let type_ok = options
            .mime_prefix()
            .as_ref()
            .is_none_or(|prefix| self.mime_type.starts_with(prefix.as_str()));
        folder_ok && type_ok
    }

    /// Apply an edit. Returns true if anything changed.
    pub fn apply(&mut self, update: &MediaUpdate) -> bool {
        let mut changed = false;
        if let Some(filename) = update.filename() {
            changed |= replace_if_different(&mut self.filename, filename);
        }
        if let Some(alt_text) = update.alt_text() {
            changed |= replace_if_different(&mut self.alt_text, alt_text);
        }
        if let Some(folder) = update.folder() {
            changed |= replace_if_different(&mut self.metadata.folder, folder);
        }
        changed
    }
}

fn replace_if_different(slot: &mut String, value: &str) -> bool {
    if slot == value {
        return false;
    }
    *slot = value.to_string();
    true
}

impl MediaRecordBuilder {
    /// Build the record, defaulting alt text to the filename stem.
    pub fn build(&self) -> Result<MediaRecord, BuilderError> {
        let mut record = self.build_internal()?;
        if record.alt_text.is_empty() {
            record.alt_text = MediaRecord::filename_stem(&record.filename).to_string();
        }
        Ok(record)
    }
}
