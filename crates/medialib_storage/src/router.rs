//! The media library service: backend selection, fallback, listing and
//! deletion routing.

use crate::{
    LedgerCache, LocalObjectStore, MediaBackend, MetadataLedger, RemoteLedger, StorageResult,
    UploadRequest, generate_file_name, sanitize_file_name,
};
use chrono::Utc;
use derive_getters::Getters;
use medialib_core::{
    ListOptions, MediaBlob, MediaRecord, MediaUpdate, ProgressReporter, StorageProvider,
    UploadOptions,
};
use medialib_error::{StorageError, StorageErrorKind};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

const OBJECTS_DIR: &str = "objects";
const LEDGER_FILE: &str = "ledger.json";

/// Which path an upload took.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// The requested backend stored the blob.
    Stored {
        /// Backend holding the blob
        provider: StorageProvider,
        /// Committed record
        record: MediaRecord,
    },
    /// The requested backend failed and the local backend stored the blob.
    FellBack {
        /// Backend the caller asked for
        requested: StorageProvider,
        /// Backend holding the blob
        provider: StorageProvider,
        /// Committed record
        record: MediaRecord,
        /// Why the requested backend was abandoned
        causes: Vec<StorageError>,
    },
    /// Every attempt failed, in attempt order.
    Failed(Vec<StorageError>),
}

impl UploadOutcome {
    /// The committed record, unless the upload failed.
    pub fn record(&self) -> Option<&MediaRecord> {
        match self {
            Self::Stored { record, .. } | Self::FellBack { record, .. } => Some(record),
            Self::Failed(_) => None,
        }
    }

    /// URL of the stored blob, unless the upload failed.
    pub fn url(&self) -> Option<&str> {
        self.record().map(|r| r.url().as_str())
    }

    /// True when some backend stored the blob.
    pub fn is_success(&self) -> bool {
        self.record().is_some()
    }

    /// The record, or the most specific error.
    ///
    /// A missing-credentials error only explains why the requested backend
    /// was skipped, so any other error is preferred over it.
    pub fn into_result(self) -> StorageResult<MediaRecord> {
        match self {
            Self::Stored { record, .. } | Self::FellBack { record, .. } => Ok(record),
            Self::Failed(mut errors) => {
                if errors.is_empty() {
                    return Err(StorageError::new(StorageErrorKind::Unavailable(
                        "no storage backend attempted".to_string(),
                    )));
                }
                let index = errors
                    .iter()
                    .rposition(|e| !matches!(e.kind(), StorageErrorKind::Configuration(_)))
                    .unwrap_or(errors.len() - 1);
                Err(errors.swap_remove(index))
            }
        }
    }
}

/// One item of a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct DeleteTarget {
    id: String,
    url: String,
}

impl DeleteTarget {
    /// Target the record `id` stored under `url`.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    /// Pair up parallel id and url lists.
    ///
    /// # Errors
    ///
    /// `Precondition` when the lists differ in length.
    pub fn zip<I, U>(ids: I, urls: U) -> StorageResult<Vec<Self>>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        if ids.len() != urls.len() {
            return Err(StorageError::new(StorageErrorKind::Precondition(format!(
                "{} ids but {} urls",
                ids.len(),
                urls.len()
            ))));
        }
        Ok(ids
            .into_iter()
            .zip(urls)
            .map(|(id, url)| Self { id, url })
            .collect())
    }
}

/// Per-item result of a batch delete.
#[derive(Debug, Default, Getters)]
pub struct DeleteReport {
    /// Items removed from blob storage and the ledger
    deleted: Vec<DeleteTarget>,
    /// Items left in place, with the reason
    failed: Vec<(DeleteTarget, StorageError)>,
}

impl DeleteReport {
    /// True when nothing failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builder for [`MediaLibrary`].
pub struct MediaLibraryBuilder {
    data_dir: PathBuf,
    default_provider: StorageProvider,
    backends: Vec<Arc<dyn MediaBackend>>,
    remote_ledger: Option<Arc<dyn RemoteLedger>>,
}

impl MediaLibraryBuilder {
    /// Backend used when an upload does not name one. Defaults to local.
    pub fn default_provider(mut self, provider: StorageProvider) -> Self {
        self.default_provider = provider;
        self
    }

    /// Register a remote backend. A later registration for the same provider
    /// replaces an earlier one; the local backend cannot be replaced.
    pub fn backend(mut self, backend: Arc<dyn MediaBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Replicate the ledger to a remote table.
    pub fn remote_ledger(mut self, ledger: Arc<dyn RemoteLedger>) -> Self {
        self.remote_ledger = Some(ledger);
        self
    }

    /// Open the local store and ledger under the data directory.
    ///
    /// # Errors
    ///
    /// Fails when the local store or snapshot cannot be opened, or when a
    /// remote ledger is attached outside a tokio runtime.
    #[instrument(skip(self), fields(data_dir = %self.data_dir.display()))]
    pub async fn build(self) -> StorageResult<MediaLibrary> {
        let store = LocalObjectStore::open(self.data_dir.join(OBJECTS_DIR)).await?;
        let cache = LedgerCache::open(self.data_dir.join(LEDGER_FILE)).await?;
        let ledger = MetadataLedger::new(cache, self.remote_ledger)?;

        let mut backends: HashMap<StorageProvider, Arc<dyn MediaBackend>> = HashMap::new();
        for backend in self.backends {
            if backend.provider() == StorageProvider::Local {
                warn!("Ignoring extra local backend registration");
                continue;
            }
            backends.insert(backend.provider(), backend);
        }
        backends.insert(StorageProvider::Local, Arc::new(store.clone()));

        info!(
            default_provider = %self.default_provider,
            backends = backends.len(),
            remote_ledger = ledger.has_remote(),
            "Media library ready"
        );
        Ok(MediaLibrary {
            store,
            backends,
            default_provider: self.default_provider,
            ledger,
        })
    }
}

/// Single entry point for uploading, listing, editing and deleting media.
///
/// Configuration is fixed at construction. Uploads try the requested backend
/// and fall back to the local store; every stored blob is committed to the
/// [`MetadataLedger`].
pub struct MediaLibrary {
    store: LocalObjectStore,
    backends: HashMap<StorageProvider, Arc<dyn MediaBackend>>,
    default_provider: StorageProvider,
    ledger: MetadataLedger,
}

impl std::fmt::Debug for MediaLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<_> = self.backends.keys().collect();
        providers.sort();
        f.debug_struct("MediaLibrary")
            .field("store", &self.store.root())
            .field("backends", &providers)
            .field("default_provider", &self.default_provider)
            .field("ledger", &self.ledger)
            .finish()
    }
}

impl MediaLibrary {
    /// Start building a library whose local state lives under `data_dir`.
    pub fn builder(data_dir: impl Into<PathBuf>) -> MediaLibraryBuilder {
        MediaLibraryBuilder {
            data_dir: data_dir.into(),
            default_provider: StorageProvider::Local,
            backends: Vec::new(),
            remote_ledger: None,
        }
    }

    /// Backend used when an upload does not name one.
    pub fn default_provider(&self) -> StorageProvider {
        self.default_provider
    }

    /// Local object store.
    pub fn store(&self) -> &LocalObjectStore {
        &self.store
    }

    /// Metadata ledger.
    pub fn ledger(&self) -> &MetadataLedger {
        &self.ledger
    }

    /// Store a blob, falling back to the local backend if the requested one
    /// fails.
    ///
    /// Payload constraints are checked before any backend is touched; a
    /// rejected payload yields `Failed` with a single `Validation` error.
    #[instrument(skip(self, blob, options), fields(name = %blob.name(), size = blob.size_bytes(), folder = %options.folder()))]
    pub async fn upload(&self, blob: &MediaBlob, options: &UploadOptions) -> UploadOutcome {
        if let Err(e) = validate(blob, options) {
            warn!(error = %e, "Upload rejected");
            return UploadOutcome::Failed(vec![e]);
        }

        let requested = options.storage_type().unwrap_or(self.default_provider);
        let file_name = match options.file_name() {
            Some(name) => sanitize_file_name(name),
            None => generate_file_name(blob.name()),
        };
        let folder = options.folder().trim_matches('/');
        let request = UploadRequest::new(blob, folder, &file_name, options.alt_text(), Utc::now());
        let progress = ProgressReporter::new(options.on_progress().cloned());

        let mut attempts = vec![requested];
        if requested != StorageProvider::Local {
            attempts.push(StorageProvider::Local);
        }

        let mut errors = Vec::new();
        for provider in attempts {
            match self.attempt(provider, &request, &progress).await {
                Ok(record) => {
                    if let Err(e) = self.ledger.commit(&record).await {
                        warn!(error = %e, url = %record.url(), "Local ledger write failed");
                    }
                    progress.complete();
                    info!(provider = %provider, url = %record.url(), "Upload stored");
                    return if errors.is_empty() {
                        UploadOutcome::Stored { provider, record }
                    } else {
                        UploadOutcome::FellBack {
                            requested,
                            provider,
                            record,
                            causes: errors,
                        }
                    };
                }
                Err(e) => {
                    warn!(provider = %provider, error = %e, "Upload attempt failed");
                    errors.push(e);
                }
            }
        }

        error!(attempts = errors.len(), "Every storage backend failed");
        UploadOutcome::Failed(errors)
    }

    async fn attempt(
        &self,
        provider: StorageProvider,
        request: &UploadRequest<'_>,
        progress: &ProgressReporter,
    ) -> StorageResult<MediaRecord> {
        let backend = self.backend(provider)?;
        backend.ensure_available()?;
        backend.upload(request, progress).await
    }

    fn backend(&self, provider: StorageProvider) -> StorageResult<&Arc<dyn MediaBackend>> {
        self.backends.get(&provider).ok_or_else(|| {
            StorageError::new(StorageErrorKind::Configuration(format!(
                "no {} backend registered",
                provider
            )))
        })
    }

    /// Store a blob and return its URL.
    ///
    /// # Errors
    ///
    /// Fails only when validation rejects the payload or every backend failed.
    pub async fn upload_file(&self, blob: &MediaBlob, options: &UploadOptions) -> StorageResult<String> {
        let record = self.upload(blob, options).await.into_result()?;
        Ok(record.url().clone())
    }

    /// Merged listing of the local store, the ledger snapshot and the remote
    /// table, newest first.
    ///
    /// Never fails: unreadable sources are skipped.
    #[instrument(skip(self))]
    pub async fn list_files(&self, options: &ListOptions) -> Vec<MediaRecord> {
        let stored = match self.store.get_all(&ListOptions::default()).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Local store unreadable, listing from ledger snapshot");
                Vec::new()
            }
        };
        let cached = self.ledger.local_records().await;
        let remote = self
            .ledger
            .remote_records(options)
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| !MediaRecord::is_local_url(r.url()) || self.store.handles().resolve(r.url()).is_some());

        let listing = merge_listing(stored.into_iter().chain(cached).chain(remote), options);
        debug!(count = listing.len(), "Listed media");
        listing
    }

    /// Delete one record.
    ///
    /// # Errors
    ///
    /// The reason the item could not be removed.
    pub async fn delete_file(&self, id: &str, url: &str) -> StorageResult<()> {
        self.delete_one(&DeleteTarget::new(id, url)).await
    }

    /// Delete every target independently.
    #[instrument(skip(self, targets), fields(count = targets.len()))]
    pub async fn delete_files(&self, targets: &[DeleteTarget]) -> DeleteReport {
        let mut report = DeleteReport::default();
        for target in targets {
            match self.delete_one(target).await {
                Ok(()) => report.deleted.push(target.clone()),
                Err(e) => {
                    warn!(id = %target.id, url = %target.url, error = %e, "Delete failed");
                    report.failed.push((target.clone(), e));
                }
            }
        }
        info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Batch delete finished"
        );
        report
    }

    async fn delete_one(&self, target: &DeleteTarget) -> StorageResult<()> {
        let record = self.resolve_target(target).await?;
        if record.id() != &target.id {
            debug!(expected = %target.id, found = %record.id(), "Delete target id differs from ledger");
        }

        let backend = if MediaRecord::is_local_url(&target.url) {
            self.backend(StorageProvider::Local)?
        } else {
            self.backend(record.provider())?
        };
        match backend.delete(&record).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(url = %target.url, "Blob already gone");
            }
            Err(e) => return Err(e),
        }

        self.ledger.forget(&target.url).await?;
        info!(id = %target.id, url = %target.url, provider = %record.provider(), "Deleted media");
        Ok(())
    }

    async fn resolve_target(&self, target: &DeleteTarget) -> StorageResult<MediaRecord> {
        let not_found = || StorageError::new(StorageErrorKind::NotFound(target.url.clone()));
        if MediaRecord::is_local_url(&target.url) {
            match self.store.get_by_url(&target.url).await {
                Ok(record) => return Ok(record),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
            // Remote rows for local urls come from other sessions or from
            // superseded uploads; only this session's snapshot may be cleaned up.
            return self
                .ledger
                .cache()
                .find_by_url(&target.url)
                .await
                .ok_or_else(not_found);
        }
        self.ledger.find(&target.url).await.ok_or_else(not_found)
    }

    /// Edit a record's filename, alt text or folder label.
    ///
    /// Records only the remote table knows, such as uploads from another
    /// session, are edited there directly.
    ///
    /// # Errors
    ///
    /// `NotFound` when neither the ledger, the local store nor the remote
    /// table knows the id.
    #[instrument(skip(self, update))]
    pub async fn update_file(&self, id: &str, update: &MediaUpdate) -> StorageResult<MediaRecord> {
        match self.ledger.update(id, update).await {
            Ok(record) => {
                if record.is_local() {
                    if let Err(e) = self.store.update(id, update).await {
                        warn!(error = %e, "Local store record not updated");
                    }
                }
                Ok(record)
            }
            Err(e) if e.is_not_found() => match self.store.update(id, update).await {
                Ok(record) => {
                    if let Err(e) = self.ledger.commit(&record).await {
                        warn!(error = %e, "Local ledger write failed");
                    }
                    Ok(record)
                }
                Err(e) if e.is_not_found() => self.ledger.update_remote(id, update).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// Bytes behind a local `blob:` URL.
    ///
    /// # Errors
    ///
    /// `NotFound` for revoked or unknown handles.
    pub async fn read_local_blob(&self, url: &str) -> StorageResult<Vec<u8>> {
        self.store.read(url).await
    }

    /// Wait for queued remote ledger writes.
    pub async fn flush(&self) -> StorageResult<()> {
        self.ledger.flush().await
    }
}

fn validate(blob: &MediaBlob, options: &UploadOptions) -> StorageResult<()> {
    options.constraints().validate(blob)?;
    if options.folder().trim_matches('/').is_empty() {
        return Err(StorageError::new(StorageErrorKind::Validation(
            "folder must not be empty".to_string(),
        )));
    }
    Ok(())
}

/// Deduplicate by url keeping the first occurrence, then filter, sort newest
/// first and truncate.
///
/// Sources earlier in the iterator win on conflict, so callers chain the most
/// trusted source first.
pub fn merge_listing(
    records: impl IntoIterator<Item = MediaRecord>,
    options: &ListOptions,
) -> Vec<MediaRecord> {
    let mut seen = HashSet::new();
    let mut merged: Vec<MediaRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.url().clone()))
        .filter(|r| r.matches(options))
        .collect();
    merged.sort_by(|a, b| b.created_at().cmp(a.created_at()));
    if let Some(limit) = options.limit() {
        merged.truncate(*limit);
    }
    merged
}
