//! Metadata ledger: an authoritative local snapshot plus best-effort
//! replication to an optional remote table.

mod cache;
mod memory;
mod remote;
mod replication;

pub use cache::LedgerCache;
pub use memory::InMemoryLedger;
pub use remote::{PostgrestLedger, RemoteLedger};

use crate::StorageResult;
use medialib_core::{ListOptions, MediaRecord, MediaUpdate};
use medialib_error::{StorageError, StorageErrorKind};
use replication::Replicator;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, instrument, warn};

/// Record set describing every stored blob.
///
/// The [`LedgerCache`] is the source of truth for this process. Changes are
/// forwarded to the remote table through a background worker and never wait
/// on it; remote reads are merged in by the router and degrade to `None` on
/// failure.
///
/// URLs forgotten in this session are remembered so a remote row whose delete
/// has not landed yet never reappears in a listing.
#[derive(Debug)]
pub struct MetadataLedger {
    cache: LedgerCache,
    remote: Option<Arc<dyn RemoteLedger>>,
    replicator: Option<Replicator>,
    tombstones: RwLock<HashSet<String>>,
}

impl MetadataLedger {
    /// Wrap a cache and, if given, start replicating to `remote`.
    ///
    /// # Errors
    ///
    /// `Unavailable` when a remote is given outside a tokio runtime.
    pub fn new(cache: LedgerCache, remote: Option<Arc<dyn RemoteLedger>>) -> StorageResult<Self> {
        let replicator = remote.clone().map(Replicator::spawn).transpose()?;
        Ok(Self {
            cache,
            remote,
            replicator,
            tombstones: RwLock::new(HashSet::new()),
        })
    }

    /// Local snapshot.
    pub fn cache(&self) -> &LedgerCache {
        &self.cache
    }

    /// True when a remote table is attached.
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Record a freshly stored blob.
    ///
    /// The remote write is queued even if the local write fails, since the
    /// blob already exists.
    ///
    /// # Errors
    ///
    /// `LedgerWrite` when the local snapshot could not be persisted.
    #[instrument(skip(self, record), fields(id = %record.id(), url = %record.url()))]
    pub async fn commit(&self, record: &MediaRecord) -> StorageResult<()> {
        self.tombstones
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(record.url().as_str());

        let result = self.cache.upsert(record.clone()).await;
        if let Some(replicator) = &self.replicator {
            if let Ok(evicted) = &result {
                for old in evicted.iter().filter(|old| old.url() != record.url()) {
                    replicator.delete(old.url().clone());
                }
            }
            replicator.upsert(record.clone());
        }
        result.map(|evicted| {
            debug!(evicted = evicted.len(), "Committed ledger record");
        })
    }

    /// Every record in the local snapshot.
    pub async fn local_records(&self) -> Vec<MediaRecord> {
        self.cache.snapshot().await
    }

    /// Remote rows passing `options`, minus forgotten urls.
    ///
    /// `None` when no remote is attached or the query failed.
    #[instrument(skip(self))]
    pub async fn remote_records(&self, options: &ListOptions) -> Option<Vec<MediaRecord>> {
        let remote = self.remote.as_ref()?;
        match remote.select(options).await {
            Ok(records) => {
                let tombstones = self.tombstones.read().unwrap_or_else(PoisonError::into_inner);
                Some(
                    records
                        .into_iter()
                        .filter(|r| !tombstones.contains(r.url().as_str()))
                        .collect(),
                )
            }
            Err(e) => {
                warn!(error = %e, "Remote ledger query failed, listing local records only");
                None
            }
        }
    }

    /// Record stored under `url`, from the local snapshot or else the remote
    /// table.
    #[instrument(skip(self))]
    pub async fn find(&self, url: &str) -> Option<MediaRecord> {
        if let Some(record) = self.cache.find_by_url(url).await {
            return Some(record);
        }
        let remote = self.remote.as_ref()?;
        match remote.find_by_url(url).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Remote ledger lookup failed");
                None
            }
        }
    }

    /// Record with this id in the local snapshot.
    pub async fn find_by_id(&self, id: &str) -> Option<MediaRecord> {
        self.cache.find_by_id(id).await
    }

    /// Drop the entry for `url` everywhere.
    ///
    /// # Errors
    ///
    /// `LedgerWrite` when the local snapshot could not be persisted. The url
    /// stays hidden from remote listings either way.
    #[instrument(skip(self))]
    pub async fn forget(&self, url: &str) -> StorageResult<()> {
        self.tombstones
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string());
        if let Some(replicator) = &self.replicator {
            replicator.delete(url);
        }
        self.cache.remove(url).await?;
        Ok(())
    }

    /// Edit the entry with `id` and replicate the change.
    ///
    /// # Errors
    ///
    /// `NotFound` when the local snapshot has no such id.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: &MediaUpdate) -> StorageResult<MediaRecord> {
        let record = self.cache.update(id, update).await?;
        if let Some(replicator) = &self.replicator {
            replicator.update(record.clone());
        }
        Ok(record)
    }

    /// Edit a row known only to the remote table.
    ///
    /// The write goes straight to the table rather than through the
    /// replication queue, since no local copy holds the edit.
    ///
    /// # Errors
    ///
    /// `NotFound` when no remote is attached, the id is unknown or its url
    /// was forgotten in this session. `LedgerWrite` when the table rejects
    /// the change.
    #[instrument(skip(self, update))]
    pub async fn update_remote(&self, id: &str, update: &MediaUpdate) -> StorageResult<MediaRecord> {
        let not_found = || StorageError::new(StorageErrorKind::NotFound(id.to_string()));
        let remote = self.remote.as_ref().ok_or_else(not_found)?;
        let mut record = remote.find_by_id(id).await?.ok_or_else(not_found)?;
        let forgotten = self
            .tombstones
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(record.url().as_str());
        if forgotten {
            return Err(not_found());
        }
        if record.apply(update) {
            remote.update(&record).await?;
            debug!(url = %record.url(), "Updated remote ledger row");
        }
        Ok(record)
    }

    /// Wait for queued remote writes to be attempted.
    pub async fn flush(&self) -> StorageResult<()> {
        match &self.replicator {
            Some(replicator) => replicator.flush().await,
            None => Ok(()),
        }
    }

    /// Remote writes that failed and were dropped.
    pub fn replication_failures(&self) -> usize {
        self.replicator.as_ref().map_or(0, Replicator::failures)
    }
}
