//! Tests for the ledger snapshot and its replication.

use chrono::Utc;
use medialib_core::{ListOptions, MediaMetadata, MediaRecord, MediaUpdate, StorageProvider};
use medialib_error::StorageErrorKind;
use medialib_storage::{InMemoryLedger, LedgerCache, MetadataLedger, RemoteLedger};
use std::sync::Arc;
use tempfile::TempDir;

fn record(id: &str, url: &str, folder: &str) -> MediaRecord {
    MediaRecord::builder()
        .id(id)
        .filename("banner.webp")
        .url(url)
        .mime_type("image/webp")
        .size_bytes(10u64)
        .created_at(Utc::now())
        .metadata(MediaMetadata::new(
            StorageProvider::Supabase,
            folder,
            format!("{}/banner.webp", folder),
        ))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_cache_starts_empty_and_persists() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");

    let cache = LedgerCache::open(&path).await.unwrap();
    assert!(cache.snapshot().await.is_empty());

    cache.upsert(record("1", "https://cdn/1", "uploads")).await.unwrap();
    cache.upsert(record("2", "https://cdn/2", "uploads")).await.unwrap();

    let reopened = LedgerCache::open(&path).await.unwrap();
    assert_eq!(reopened.snapshot().await.len(), 2);
    assert!(reopened.find_by_url("https://cdn/2").await.is_some());
}

#[tokio::test]
async fn test_cache_upsert_evicts_same_id_or_url() {
    let temp_dir = TempDir::new().unwrap();
    let cache = LedgerCache::open(temp_dir.path().join("ledger.json")).await.unwrap();

    cache.upsert(record("1", "https://cdn/a", "uploads")).await.unwrap();

    let evicted = cache.upsert(record("1", "https://cdn/b", "uploads")).await.unwrap();
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].url(), "https://cdn/a");

    let evicted = cache.upsert(record("2", "https://cdn/b", "uploads")).await.unwrap();
    assert_eq!(evicted[0].id(), "1");

    let snapshot = cache.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id(), "2");
}

#[tokio::test]
async fn test_cache_update_and_remove() {
    let temp_dir = TempDir::new().unwrap();
    let cache = LedgerCache::open(temp_dir.path().join("ledger.json")).await.unwrap();
    cache.upsert(record("1", "https://cdn/1", "uploads")).await.unwrap();

    let updated = cache
        .update("1", &MediaUpdate::default().with_filename("renamed.webp"))
        .await
        .unwrap();
    assert_eq!(updated.filename(), "renamed.webp");
    assert_eq!(updated.url(), "https://cdn/1");

    let err = cache.update("nope", &MediaUpdate::default()).await.unwrap_err();
    assert!(err.is_not_found());

    assert!(cache.remove("https://cdn/1").await.unwrap().is_some());
    assert!(cache.remove("https://cdn/1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_corrupt_snapshot_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    std::fs::write(&path, b"{not json").unwrap();

    let err = LedgerCache::open(&path).await.unwrap_err();
    assert!(matches!(err.kind(), StorageErrorKind::Corrupt(_)));
}

#[tokio::test]
async fn test_commit_replicates_to_remote() {
    let temp_dir = TempDir::new().unwrap();
    let remote = InMemoryLedger::new();
    let cache = LedgerCache::open(temp_dir.path().join("ledger.json")).await.unwrap();
    let ledger = MetadataLedger::new(cache, Some(Arc::new(remote.clone()))).unwrap();

    ledger.commit(&record("1", "https://cdn/1", "uploads")).await.unwrap();
    ledger.flush().await.unwrap();

    assert_eq!(remote.len().await, 1);
    assert_eq!(ledger.local_records().await.len(), 1);
    assert_eq!(ledger.replication_failures(), 0);
}

#[tokio::test]
async fn test_superseded_url_is_removed_remotely() {
    let temp_dir = TempDir::new().unwrap();
    let remote = InMemoryLedger::new();
    let cache = LedgerCache::open(temp_dir.path().join("ledger.json")).await.unwrap();
    let ledger = MetadataLedger::new(cache, Some(Arc::new(remote.clone()))).unwrap();

    ledger.commit(&record("uploads/a", "blob:medialib/1", "uploads")).await.unwrap();
    ledger.commit(&record("uploads/a", "blob:medialib/2", "uploads")).await.unwrap();
    ledger.flush().await.unwrap();

    let rows = remote.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].url(), "blob:medialib/2");
}

#[tokio::test]
async fn test_forgotten_url_stays_hidden() {
    let temp_dir = TempDir::new().unwrap();
    let remote = InMemoryLedger::new();
    let cache = LedgerCache::open(temp_dir.path().join("ledger.json")).await.unwrap();
    let ledger = MetadataLedger::new(cache, Some(Arc::new(remote.clone()))).unwrap();

    let stale = record("1", "https://cdn/1", "uploads");
    ledger.commit(&stale).await.unwrap();
    ledger.forget("https://cdn/1").await.unwrap();
    ledger.flush().await.unwrap();
    assert!(remote.is_empty().await);

    // A lagging replica still holding the row.
    remote.upsert(&stale).await.unwrap();
    let listed = ledger.remote_records(&ListOptions::default()).await.unwrap();
    assert!(listed.is_empty());

    // Re-committing the url lifts the tombstone.
    ledger.commit(&stale).await.unwrap();
    let listed = ledger.remote_records(&ListOptions::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_offline_remote_is_best_effort() {
    let temp_dir = TempDir::new().unwrap();
    let remote = InMemoryLedger::new();
    remote.set_offline(true);
    let cache = LedgerCache::open(temp_dir.path().join("ledger.json")).await.unwrap();
    let ledger = MetadataLedger::new(cache, Some(Arc::new(remote.clone()))).unwrap();

    ledger.commit(&record("1", "https://cdn/1", "uploads")).await.unwrap();
    ledger.flush().await.unwrap();

    assert_eq!(ledger.local_records().await.len(), 1);
    assert_eq!(ledger.replication_failures(), 1);
    assert!(ledger.remote_records(&ListOptions::default()).await.is_none());
    assert!(ledger.find("https://cdn/1").await.is_some());
}
