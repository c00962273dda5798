//! In-process remote ledger.

use super::RemoteLedger;
use crate::StorageResult;
use medialib_core::{ListOptions, MediaRecord};
use medialib_error::{StorageError, StorageErrorKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// A [`RemoteLedger`] kept in memory.
///
/// Useful for tests and for running without a hosted table. It can be taken
/// offline to simulate an unreachable service: every call then fails with a
/// transfer error.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    rows: Arc<RwLock<Vec<MediaRecord>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing or regaining connectivity.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every row, regardless of connectivity (for testing).
    pub async fn rows(&self) -> Vec<MediaRecord> {
        self.rows.read().await.clone()
    }

    /// Number of rows (for testing).
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Check if the ledger is empty (for testing).
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::new(StorageErrorKind::transfer(
                "in-memory ledger",
                "offline",
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteLedger for InMemoryLedger {
    async fn select(&self, options: &ListOptions) -> StorageResult<Vec<MediaRecord>> {
        self.check_online()?;
        let mut rows: Vec<MediaRecord> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| r.matches(options))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        if let Some(limit) = options.limit() {
            rows.truncate(*limit);
        }
        Ok(rows)
    }

    async fn find_by_url(&self, url: &str) -> StorageResult<Option<MediaRecord>> {
        self.check_online()?;
        Ok(self.rows.read().await.iter().find(|r| r.url() == url).cloned())
    }

    async fn find_by_id(&self, id: &str) -> StorageResult<Option<MediaRecord>> {
        self.check_online()?;
        Ok(self.rows.read().await.iter().find(|r| r.id() == id).cloned())
    }

    async fn upsert(&self, record: &MediaRecord) -> StorageResult<()> {
        self.check_online()?;
        let mut rows = self.rows.write().await;
        rows.retain(|r| r.url() != record.url());
        rows.push(record.clone());
        Ok(())
    }

    async fn update(&self, record: &MediaRecord) -> StorageResult<()> {
        self.check_online()?;
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(record.id().clone())))?;
        *row = record.clone();
        Ok(())
    }

    async fn delete_by_url(&self, url: &str) -> StorageResult<()> {
        self.check_online()?;
        self.rows.write().await.retain(|r| r.url() != url);
        Ok(())
    }
}
