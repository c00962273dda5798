//! Remote ledger table access.

use crate::http::{check_status, endpoint_url, transfer_error};
use crate::StorageResult;
use chrono::{DateTime, Utc};
use medialib_core::{ListOptions, MediaMetadata, MediaRecord, StorageProvider, SupabaseSettings};
use medialib_error::{StorageError, StorageErrorKind};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, error, instrument, warn};

const PROVIDER: &str = "cms_media";

/// A shared table of media records visible across sessions.
///
/// The table is advisory: callers treat every failure as non-fatal.
#[async_trait::async_trait]
pub trait RemoteLedger: Send + Sync + std::fmt::Debug {
    /// Rows passing the folder and type filters, newest first, at most `limit`.
    async fn select(&self, options: &ListOptions) -> StorageResult<Vec<MediaRecord>>;

    /// Row stored under `url`.
    async fn find_by_url(&self, url: &str) -> StorageResult<Option<MediaRecord>>;

    /// Row with this id.
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<MediaRecord>>;

    /// Insert a row, or overwrite the row with the same url.
    async fn upsert(&self, record: &MediaRecord) -> StorageResult<()>;

    /// Overwrite the editable fields of the row with the record's id.
    async fn update(&self, record: &MediaRecord) -> StorageResult<()>;

    /// Delete the row stored under `url`.
    async fn delete_by_url(&self, url: &str) -> StorageResult<()>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RowMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_path: Option<String>,
}

/// One `cms_media` row as the table stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MediaRow {
    id: String,
    filename: String,
    url: String,
    mime_type: String,
    size_bytes: u64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    alt_text: Option<String>,
    #[serde(default)]
    metadata: RowMetadata,
}

impl From<&MediaRecord> for MediaRow {
    fn from(record: &MediaRecord) -> Self {
        Self {
            id: record.id().clone(),
            filename: record.filename().clone(),
            url: record.url().clone(),
            mime_type: record.mime_type().clone(),
            size_bytes: *record.size_bytes(),
            created_at: *record.created_at(),
            alt_text: Some(record.alt_text().clone()),
            metadata: RowMetadata {
                storage_provider: Some(record.provider().as_str().to_string()),
                folder: Some(record.folder().to_string()),
                storage_path: Some(record.metadata().storage_path().clone()),
            },
        }
    }
}

impl MediaRow {
    /// Rows without a recognisable provider tag cannot be routed for deletion
    /// and are not turned into records.
    fn into_record(self) -> Option<MediaRecord> {
        let provider = match self
            .metadata
            .storage_provider
            .as_deref()
            .map(StorageProvider::from_str)
        {
            Some(Ok(provider)) => provider,
            _ => {
                warn!(url = %self.url, "Remote ledger row without storage provider, skipping");
                return None;
            }
        };
        let folder = self.metadata.folder.unwrap_or_default();
        let storage_path = self
            .metadata
            .storage_path
            .unwrap_or_else(|| format!("{}/{}", folder, self.filename));

        let mut builder = MediaRecord::builder();
        builder
            .id(self.id)
            .filename(self.filename)
            .url(self.url)
            .mime_type(self.mime_type)
            .size_bytes(self.size_bytes)
            .created_at(self.created_at)
            .metadata(MediaMetadata::new(provider, folder, storage_path));
        if let Some(alt_text) = self.alt_text {
            builder.alt_text(alt_text);
        }
        match builder.build() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Unusable remote ledger row, skipping");
                None
            }
        }
    }
}

/// The `cms_media` table reached through its PostgREST interface.
#[derive(Debug, Clone)]
pub struct PostgrestLedger {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl PostgrestLedger {
    /// Creates a client for the table named in `settings`.
    ///
    /// # Errors
    ///
    /// `Configuration` when the project URL or key is missing.
    pub fn new(settings: &SupabaseSettings) -> StorageResult<Self> {
        match (settings.url(), settings.anon_key()) {
            (Some(url), Some(key)) if settings.is_configured() => {
                debug!(table = %settings.table(), "Creating remote ledger client");
                Ok(Self {
                    client: Client::new(),
                    base_url: url.clone(),
                    api_key: key.clone(),
                    table: settings.table().clone(),
                })
            }
            _ => Err(StorageError::new(StorageErrorKind::Configuration(
                "remote ledger needs a supabase url and anon key".to_string(),
            ))),
        }
    }

    fn rows_url(&self) -> StorageResult<Url> {
        endpoint_url(&self.base_url, &["rest/v1", self.table.as_str()])
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch(&self, query: &[(&str, String)]) -> StorageResult<Vec<MediaRecord>> {
        let response = self
            .authorize(self.client.get(self.rows_url()?))
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Failed to query remote ledger");
                transfer_error(PROVIDER, e)
            })?;
        let rows: Vec<MediaRow> = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::transfer(
                    PROVIDER,
                    format!("malformed rows: {}", e),
                ))
            })?;
        Ok(rows.into_iter().filter_map(MediaRow::into_record).collect())
    }

    async fn write(&self, builder: RequestBuilder) -> StorageResult<()> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| as_ledger_write(transfer_error(PROVIDER, e)))?;
        check_status(PROVIDER, response)
            .await
            .map_err(as_ledger_write)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteLedger for PostgrestLedger {
    #[instrument(skip(self))]
    async fn select(&self, options: &ListOptions) -> StorageResult<Vec<MediaRecord>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(folder) = options.folder() {
            query.push(("metadata->>folder", format!("eq.{}", folder)));
        }
        if let Some(prefix) = options.mime_prefix() {
            query.push(("mime_type", format!("like.{}*", prefix)));
        }
        if let Some(limit) = options.limit() {
            query.push(("limit", limit.to_string()));
        }
        let records = self.fetch(&query).await?;
        debug!(count = records.len(), "Fetched remote ledger rows");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn find_by_url(&self, url: &str) -> StorageResult<Option<MediaRecord>> {
        let query = [
            ("select", "*".to_string()),
            ("url", format!("eq.{}", url)),
            ("limit", "1".to_string()),
        ];
        Ok(self.fetch(&query).await?.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<MediaRecord>> {
        let query = [
            ("select", "*".to_string()),
            ("id", format!("eq.{}", id)),
            ("limit", "1".to_string()),
        ];
        Ok(self.fetch(&query).await?.into_iter().next())
    }

    #[instrument(skip(self, record), fields(id = %record.id(), url = %record.url()))]
    async fn upsert(&self, record: &MediaRecord) -> StorageResult<()> {
        let builder = self
            .client
            .post(self.rows_url()?)
            .query(&[("on_conflict", "url")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[MediaRow::from(record)]);
        self.write(builder).await
    }

    #[instrument(skip(self, record), fields(id = %record.id()))]
    async fn update(&self, record: &MediaRecord) -> StorageResult<()> {
        let row = MediaRow::from(record);
        let builder = self
            .client
            .patch(self.rows_url()?)
            .query(&[("id", format!("eq.{}", record.id()))])
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({
                "filename": row.filename,
                "alt_text": row.alt_text,
                "metadata": row.metadata,
            }));
        self.write(builder).await
    }

    #[instrument(skip(self))]
    async fn delete_by_url(&self, url: &str) -> StorageResult<()> {
        let builder = self
            .client
            .delete(self.rows_url()?)
            .query(&[("url", format!("eq.{}", url))])
            .header("Prefer", "return=minimal");
        self.write(builder).await
    }
}

#[track_caller]
fn as_ledger_write(e: StorageError) -> StorageError {
    StorageError::new(StorageErrorKind::LedgerWrite(e.kind().to_string()))
}
