//! Hosted object-storage bucket adapter.

use crate::http::{check_status, endpoint_url, transfer_error};
use crate::{MediaBackend, StorageResult, UploadRequest};
use medialib_core::{MediaRecord, ProgressReporter, StorageProvider, SupabaseSettings};
use medialib_error::{StorageError, StorageErrorKind};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, error, instrument};
use uuid::Uuid;

const PROVIDER: &str = "supabase";

/// Stores blobs in a bucket at `<folder>/<filename>` and serves them from the
/// bucket's public URL.
#[derive(Debug, Clone)]
pub struct SupabaseBucket {
    client: Client,
    settings: SupabaseSettings,
}

impl SupabaseBucket {
    /// Creates an adapter for the given settings.
    pub fn new(settings: SupabaseSettings) -> Self {
        debug!(bucket = %settings.bucket(), "Creating bucket adapter");
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn credentials(&self) -> StorageResult<(&str, &str)> {
        match (self.settings.url().as_deref(), self.settings.anon_key().as_deref()) {
            (Some(url), Some(key)) if self.settings.is_configured() => Ok((url, key)),
            _ => Err(StorageError::new(StorageErrorKind::Configuration(
                "supabase url and anon key are required".to_string(),
            ))),
        }
    }

    fn authorize(builder: RequestBuilder, key: &str) -> RequestBuilder {
        builder.header("apikey", key).bearer_auth(key)
    }

    /// Public URL of an object in the bucket.
    ///
    /// # Errors
    ///
    /// `Configuration` when the project URL is missing or invalid.
    pub fn public_url(&self, path: &str) -> StorageResult<String> {
        let (base, _) = self.credentials()?;
        let url = endpoint_url(
            base,
            &["storage/v1/object/public", self.settings.bucket().as_str(), path],
        )?;
        Ok(url.to_string())
    }
}

#[async_trait::async_trait]
impl MediaBackend for SupabaseBucket {
    fn provider(&self) -> StorageProvider {
        StorageProvider::Supabase
    }

    fn ensure_available(&self) -> StorageResult<()> {
        self.credentials().map(|_| ())
    }

    #[instrument(skip(self, request, progress), fields(path = %request.storage_path()))]
    async fn upload(
        &self,
        request: &UploadRequest<'_>,
        progress: &ProgressReporter,
    ) -> StorageResult<MediaRecord> {
        let (base, key) = self.credentials()?;
        let storage_path = request.storage_path();
        let blob = request.blob();
        let url = endpoint_url(
            base,
            &["storage/v1/object", self.settings.bucket().as_str(), storage_path.as_str()],
        )?;

        progress.report(10);
        let response = Self::authorize(self.client.post(url), key)
            .header("content-type", blob.mime_type())
            .header("x-upsert", "true")
            .body(blob.data().to_vec())
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Failed to send upload to bucket");
                transfer_error(PROVIDER, e)
            })?;
        check_status(PROVIDER, response).await?;
        progress.report(70);

        let public_url = self.public_url(&storage_path)?;
        progress.report(90);

        debug!(url = %public_url, "Bucket upload accepted");
        request.record(
            Uuid::new_v4().to_string(),
            public_url,
            StorageProvider::Supabase,
            storage_path,
        )
    }

    #[instrument(skip(self, record), fields(url = %record.url()))]
    async fn delete(&self, record: &MediaRecord) -> StorageResult<()> {
        let (base, key) = self.credentials()?;
        let path = record.metadata().storage_path();
        if path.is_empty() || self.public_url(path)? != *record.url() {
            return Err(StorageError::new(StorageErrorKind::Precondition(format!(
                "cannot resolve bucket path for {}",
                record.url()
            ))));
        }

        let url = endpoint_url(base, &["storage/v1/object", self.settings.bucket().as_str()])?;
        let response = Self::authorize(self.client.delete(url), key)
            .json(&serde_json::json!({ "prefixes": [path] }))
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Failed to send delete to bucket");
                transfer_error(PROVIDER, e)
            })?;
        let response = check_status(PROVIDER, response).await?;

        let removed: Vec<serde_json::Value> = response.json().await.map_err(|e| {
            StorageError::new(StorageErrorKind::transfer(
                PROVIDER,
                format!("malformed delete response: {}", e),
            ))
        })?;
        if removed.is_empty() {
            return Err(StorageError::new(StorageErrorKind::NotFound(path.clone())));
        }
        debug!(path = %path, "Bucket object deleted");
        Ok(())
    }
}
