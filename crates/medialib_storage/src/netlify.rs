//! Large-media HTTP API adapter.

use crate::http::{check_status, endpoint_url, transfer_error};
use crate::{MediaBackend, StorageResult, UploadRequest};
use medialib_core::{MediaRecord, NetlifySettings, ProgressReporter, StorageProvider};
use medialib_error::{StorageError, StorageErrorKind};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, error, instrument};
use uuid::Uuid;

const PROVIDER: &str = "netlify";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Uploads blobs to a site's large-media store and returns CDN URLs.
///
/// Requires both an access token and a site id. Without them every operation
/// fails with a `Configuration` error before any request is sent.
#[derive(Debug, Clone)]
pub struct NetlifyLargeMedia {
    client: Client,
    settings: NetlifySettings,
}

impl NetlifyLargeMedia {
    /// Creates an adapter for the given settings.
    pub fn new(settings: NetlifySettings) -> Self {
        debug!(endpoint = %settings.api_endpoint(), "Creating large-media adapter");
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn credentials(&self) -> StorageResult<(&str, &str)> {
        match (
            self.settings.access_token().as_deref(),
            self.settings.site_id().as_deref(),
        ) {
            (Some(token), Some(site)) if !token.trim().is_empty() && !site.trim().is_empty() => {
                Ok((token, site))
            }
            _ => Err(StorageError::new(StorageErrorKind::Configuration(
                "netlify access token and site id are required".to_string(),
            ))),
        }
    }

    fn files_url(&self, site: &str, path: Option<&str>) -> StorageResult<reqwest::Url> {
        let mut segments = vec!["sites", site, "files"];
        segments.extend(path);
        endpoint_url(self.settings.api_endpoint(), &segments)
    }
}

#[async_trait::async_trait]
impl MediaBackend for NetlifyLargeMedia {
    fn provider(&self) -> StorageProvider {
        StorageProvider::Netlify
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
        let (token, site) = self.credentials()?;
        let storage_path = request.storage_path();
        let blob = request.blob();

        let part = Part::bytes(blob.data().to_vec())
            .file_name(request.file_name().to_string())
            .mime_str(blob.mime_type())
            .map_err(|e| transfer_error(PROVIDER, e))?;
        let form = Form::new()
            .part("file", part)
            .text("path", storage_path.clone());

        progress.report(10);
        let response = self
            .client
            .post(self.files_url(site, None)?)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Failed to send upload to large-media API");
                transfer_error(PROVIDER, e)
            })?;
        let response = check_status(PROVIDER, response).await?;
        progress.report(70);

        let body: UploadResponse = response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse large-media upload response");
            StorageError::new(StorageErrorKind::transfer(
                PROVIDER,
                format!("malformed upload response: {}", e),
            ))
        })?;
        if body.url.trim().is_empty() {
            return Err(StorageError::new(StorageErrorKind::transfer(
                PROVIDER,
                "upload response carried an empty url",
            )));
        }
        progress.report(90);

        debug!(url = %body.url, "Large-media upload accepted");
        request.record(
            Uuid::new_v4().to_string(),
            body.url,
            StorageProvider::Netlify,
            storage_path,
        )
    }

    #[instrument(skip(self, record), fields(url = %record.url()))]
    async fn delete(&self, record: &MediaRecord) -> StorageResult<()> {
        let (token, site) = self.credentials()?;
        let path = record.metadata().storage_path();
        if path.is_empty() {
            return Err(StorageError::new(StorageErrorKind::Precondition(format!(
                "no storage path recorded for {}",
                record.url()
            ))));
        }

        let response = self
            .client
            .delete(self.files_url(site, Some(path))?)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Failed to send delete to large-media API");
                transfer_error(PROVIDER, e)
            })?;
        check_status(PROVIDER, response).await?;
        debug!(path = %path, "Large-media blob deleted");
        Ok(())
    }
}
