//! Options accepted by the router's upload, list and edit operations.

use crate::{MediaBlob, ProgressFn, StorageProvider};
use derive_getters::Getters;
use medialib_error::{StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_FOLDER: &str = "uploads";

/// Caller-stated constraints checked before any I/O.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct UploadConstraints {
    /// Accepted MIME prefixes (`image/`, `video/mp4`); empty accepts everything
    #[serde(default)]
    accept: Vec<String>,
    /// Maximum payload size
    #[serde(default)]
    #[setters(strip_option)]
    max_size_bytes: Option<u64>,
}

impl UploadConstraints {
    /// Only accept images.
    pub fn images() -> Self {
        Self::default().with_accept(vec!["image/".to_string()])
    }

    /// Check a payload against these constraints.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error with a human-readable reason.
    pub fn validate(&self, blob: &MediaBlob) -> Result<(), StorageError> {
        if blob.data().is_empty() {
            return Err(StorageError::new(StorageErrorKind::Validation(format!(
                "{} is empty",
                blob.name()
            ))));
        }
        if !self.accept.is_empty()
            && !self
                .accept
                .iter()
                .any(|prefix| blob.mime_type().starts_with(prefix.as_str()))
        {
            return Err(StorageError::new(StorageErrorKind::Validation(format!(
                "{} has type {}, expected one of: {}",
                blob.name(),
                blob.mime_type(),
                self.accept.join(", ")
            ))));
        }
        if let Some(max) = self.max_size_bytes {
            if blob.size_bytes() > max {
                return Err(StorageError::new(StorageErrorKind::Validation(format!(
                    "{} is {} bytes, limit is {} bytes",
                    blob.name(),
                    blob.size_bytes(),
                    max
                ))));
            }
        }
        Ok(())
    }
}

/// Options for a single upload.
#[derive(Clone)]
pub struct UploadOptions {
    folder: String,
    file_name: Option<String>,
    storage_type: Option<StorageProvider>,
    alt_text: Option<String>,
    constraints: UploadConstraints,
    on_progress: Option<ProgressFn>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            folder: DEFAULT_FOLDER.to_string(),
            file_name: None,
            storage_type: None,
            alt_text: None,
            constraints: UploadConstraints::default(),
            on_progress: None,
        }
    }
}

impl std::fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOptions")
            .field("folder", &self.folder)
            .field("file_name", &self.file_name)
            .field("storage_type", &self.storage_type)
            .field("alt_text", &self.alt_text)
            .field("constraints", &self.constraints)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl UploadOptions {
    /// Set the destination folder.
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Store under an explicit filename instead of a generated one.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Override the process-wide default backend.
    pub fn with_storage_type(mut self, storage_type: StorageProvider) -> Self {
        self.storage_type = Some(storage_type);
        self
    }

    /// Set alt text instead of the filename stem.
    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = Some(alt_text.into());
        self
    }

    /// Reject payloads violating these constraints.
    pub fn with_constraints(mut self, constraints: UploadConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Receive integer percentages as the transfer advances.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Destination folder.
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Explicit filename, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Backend override, if any.
    pub fn storage_type(&self) -> Option<StorageProvider> {
        self.storage_type
    }

    /// Alt text override, if any.
    pub fn alt_text(&self) -> Option<&str> {
        self.alt_text.as_deref()
    }

    /// Payload constraints.
    pub fn constraints(&self) -> &UploadConstraints {
        &self.constraints
    }

    /// Progress callback, if any.
    pub fn on_progress(&self) -> Option<&ProgressFn> {
        self.on_progress.as_ref()
    }
}

/// Filters for a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_", strip_option, into)]
pub struct ListOptions {
    /// Only records in this folder
    folder: Option<String>,
    /// Only records whose MIME type starts with this prefix
    mime_prefix: Option<String>,
    /// Return at most this many records
    limit: Option<usize>,
}

/// An edit to a record's user-facing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_", strip_option, into)]
pub struct MediaUpdate {
    /// New display name
    filename: Option<String>,
    /// New alt text
    alt_text: Option<String>,
    /// New folder label
    folder: Option<String>,
}

impl MediaUpdate {
    /// True when the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.alt_text.is_none() && self.folder.is_none()
    }
}
