//! Binary payloads handed to the router.

use medialib_error::StorageError;
use std::path::Path;

/// A binary payload with its original name and MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    name: String,
    mime_type: String,
    data: Vec<u8>,
}

impl MediaBlob {
    /// Wrap bytes already in memory.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read a whole file into a blob, guessing the MIME type from its extension
    /// unless one is given.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Io` storage errors when the file cannot be read.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn read_from(
        path: impl AsRef<Path>,
        mime_type: Option<String>,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = mime_type.unwrap_or_else(|| Self::guess_mime(&name).to_string());
        tracing::debug!(name = %name, mime_type = %mime_type, size = data.len(), "Read blob from disk");
        Ok(Self::new(name, mime_type, data))
    }

    /// MIME type for common web media extensions.
    pub fn guess_mime(name: &str) -> &'static str {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            "avif" => "image/avif",
            "ico" => "image/x-icon",
            "mp4" => "video/mp4",
            "webm" => "video/webm",
            "mp3" => "audio/mpeg",
            "pdf" => "application/pdf",
            "json" => "application/json",
            _ => "application/octet-stream",
        }
    }

    /// Original file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}
