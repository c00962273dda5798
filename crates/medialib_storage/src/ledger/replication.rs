//! Background replication of ledger changes to the remote table.

use super::RemoteLedger;
use crate::StorageResult;
use medialib_core::MediaRecord;
use medialib_error::{StorageError, StorageErrorKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
enum Command {
    Upsert(MediaRecord),
    Update(MediaRecord),
    Delete { url: String },
    Flush(oneshot::Sender<()>),
}

/// Queue feeding a single worker task that applies changes to a
/// [`RemoteLedger`] in submission order.
///
/// Failed writes are logged and dropped; [`Replicator::failures`] counts them.
/// The worker stops once every handle to the queue is dropped.
#[derive(Debug, Clone)]
pub(crate) struct Replicator {
    tx: mpsc::UnboundedSender<Command>,
    failures: Arc<AtomicUsize>,
}

impl Replicator {
    /// Start the worker on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// `Unavailable` when called outside a runtime.
    pub(crate) fn spawn(remote: Arc<dyn RemoteLedger>) -> StorageResult<Self> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            StorageError::new(StorageErrorKind::Unavailable(format!(
                "replication needs a tokio runtime: {}",
                e
            )))
        })?;
        let (tx, rx) = mpsc::unbounded_channel();
        let failures = Arc::new(AtomicUsize::new(0));
        handle.spawn(run(rx, remote, Arc::clone(&failures)));
        tracing::debug!("Started ledger replication worker");
        Ok(Self { tx, failures })
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            tracing::warn!("Ledger replication worker is gone, dropping change");
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn upsert(&self, record: MediaRecord) {
        self.send(Command::Upsert(record));
    }

    pub(crate) fn update(&self, record: MediaRecord) {
        self.send(Command::Update(record));
    }

    pub(crate) fn delete(&self, url: impl Into<String>) {
        self.send(Command::Delete { url: url.into() });
    }

    /// Wait until every change queued before this call has been attempted.
    pub(crate) async fn flush(&self) -> StorageResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        let unavailable = || {
            StorageError::new(StorageErrorKind::Unavailable(
                "ledger replication worker stopped".to_string(),
            ))
        };
        self.tx
            .send(Command::Flush(done_tx))
            .map_err(|_| unavailable())?;
        done_rx.await.map_err(|_| unavailable())
    }

    /// Writes that could not be applied since the worker started.
    pub(crate) fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Command>,
    remote: Arc<dyn RemoteLedger>,
    failures: Arc<AtomicUsize>,
) {
    while let Some(command) = rx.recv().await {
        let (operation, result) = match command {
            Command::Upsert(record) => ("upsert", remote.upsert(&record).await),
            Command::Update(record) => ("update", remote.update(&record).await),
            Command::Delete { url } => ("delete", remote.delete_by_url(&url).await),
            Command::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };
        match result {
            Ok(()) => tracing::debug!(operation, "Replicated ledger change"),
            Err(e) => {
                failures.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(operation, error = %e, "Remote ledger write failed");
            }
        }
    }
    tracing::debug!("Ledger replication worker stopped");
}
