//! Tests for the local object store.

use chrono::Utc;
use medialib_core::{ListOptions, MediaBlob, MediaUpdate, ProgressReporter, StorageProvider};
use medialib_storage::{LocalObjectStore, MediaBackend, UploadRequest};
use tempfile::TempDir;

fn png(name: &str, size: usize) -> MediaBlob {
    MediaBlob::new(name, "image/png", vec![7u8; size])
}

#[tokio::test]
async fn test_upload_and_read_back() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalObjectStore::open(temp_dir.path()).await.unwrap();

    let blob = png("logo.png", 128);
    let request = UploadRequest::new(&blob, "uploads", "logo.png", None, Utc::now());
    let record = store.upload(&request, &ProgressReporter::silent()).await.unwrap();

    assert_eq!(record.id(), "uploads/logo.png");
    assert!(record.url().starts_with("blob:"));
    assert_eq!(record.provider(), StorageProvider::Local);
    assert_eq!(*record.size_bytes(), 128);
    assert_eq!(record.alt_text(), "logo");

    let fetched = store.get_by_url(record.url()).await.unwrap();
    assert_eq!(fetched, record);
    assert_eq!(store.read(record.url()).await.unwrap(), vec![7u8; 128]);
}

#[tokio::test]
async fn test_upload_reports_checkpoints() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalObjectStore::open(temp_dir.path()).await.unwrap();

    let blob = png("a.png", 4);
    let request = UploadRequest::new(&blob, "uploads", "a.png", None, Utc::now());
    let progress = ProgressReporter::silent();
    store.upload(&request, &progress).await.unwrap();

    assert_eq!(progress.last_reported(), Some(50));
}

#[tokio::test]
async fn test_get_all_filters_and_orders() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalObjectStore::open(temp_dir.path()).await.unwrap();

    let first = png("one.png", 1);
    let second = png("two.png", 1);
    let doc = MediaBlob::new("notes.txt", "text/plain", b"hi".to_vec());
    let earlier = Utc::now() - chrono::Duration::minutes(5);
    let silent = ProgressReporter::silent();

    store
        .upload(&UploadRequest::new(&first, "uploads", "one.png", None, earlier), &silent)
        .await
        .unwrap();
    store
        .upload(&UploadRequest::new(&second, "uploads", "two.png", None, Utc::now()), &silent)
        .await
        .unwrap();
    store
        .upload(&UploadRequest::new(&doc, "docs", "notes.txt", None, Utc::now()), &silent)
        .await
        .unwrap();

    let uploads = store
        .get_all(&ListOptions::default().with_folder("uploads"))
        .await
        .unwrap();
    let names: Vec<_> = uploads.iter().map(|r| r.filename().as_str()).collect();
    assert_eq!(names, vec!["two.png", "one.png"]);

    let images = store
        .get_all(&ListOptions::default().with_mime_prefix("image/").with_limit(1usize))
        .await
        .unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].filename(), "two.png");
}

#[tokio::test]
async fn test_delete_revokes_handle() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalObjectStore::open(temp_dir.path()).await.unwrap();

    let blob = png("gone.png", 8);
    let request = UploadRequest::new(&blob, "uploads", "gone.png", None, Utc::now());
    let record = store.upload(&request, &ProgressReporter::silent()).await.unwrap();

    let deleted = store.delete(record.id()).await.unwrap();
    assert_eq!(deleted.url(), record.url());

    assert!(store.read(record.url()).await.unwrap_err().is_not_found());
    assert!(store.get(record.id()).await.unwrap_err().is_not_found());
    assert!(store.delete(record.id()).await.unwrap_err().is_not_found());
    assert!(store.handles().is_empty());
}

#[tokio::test]
async fn test_reupload_supersedes_previous_handle() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalObjectStore::open(temp_dir.path()).await.unwrap();
    let silent = ProgressReporter::silent();

    let v1 = png("hero.png", 1);
    let v2 = png("hero.png", 2);
    let first = store
        .upload(&UploadRequest::new(&v1, "uploads", "hero.png", None, Utc::now()), &silent)
        .await
        .unwrap();
    let second = store
        .upload(&UploadRequest::new(&v2, "uploads", "hero.png", None, Utc::now()), &silent)
        .await
        .unwrap();

    assert_eq!(first.id(), second.id());
    assert_ne!(first.url(), second.url());
    assert!(store.read(first.url()).await.unwrap_err().is_not_found());
    assert_eq!(store.read(second.url()).await.unwrap().len(), 2);
    assert_eq!(store.get_all(&ListOptions::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_backend_delete_of_superseded_record_keeps_newer_blob() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalObjectStore::open(temp_dir.path()).await.unwrap();
    let silent = ProgressReporter::silent();

    let v1 = png("hero.png", 1);
    let v2 = png("hero.png", 2);
    let first = store
        .upload(&UploadRequest::new(&v1, "uploads", "hero.png", None, Utc::now()), &silent)
        .await
        .unwrap();
    let second = store
        .upload(&UploadRequest::new(&v2, "uploads", "hero.png", None, Utc::now()), &silent)
        .await
        .unwrap();

    // Same id, revoked handle.
    let err = MediaBackend::delete(&store, &first).await.unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(store.read(second.url()).await.unwrap().len(), 2);
    assert_eq!(store.get(second.id()).await.unwrap().url(), second.url());
}

#[tokio::test]
async fn test_handles_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let record = {
        let store = LocalObjectStore::open(temp_dir.path()).await.unwrap();
        let blob = png("keep.png", 16);
        let request = UploadRequest::new(&blob, "uploads", "keep.png", None, Utc::now());
        store.upload(&request, &ProgressReporter::silent()).await.unwrap()
    };

    let reopened = LocalObjectStore::open(temp_dir.path()).await.unwrap();
    assert_eq!(reopened.get_by_url(record.url()).await.unwrap(), record);
    assert_eq!(reopened.read(record.url()).await.unwrap().len(), 16);
}

#[tokio::test]
async fn test_update_keeps_url_and_provider() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalObjectStore::open(temp_dir.path()).await.unwrap();

    let blob = png("flag.png", 3);
    let request = UploadRequest::new(&blob, "flags", "flag.png", None, Utc::now());
    let record = store.upload(&request, &ProgressReporter::silent()).await.unwrap();

    let update = MediaUpdate::default()
        .with_alt_text("Flag of Peru")
        .with_folder("countries");
    let updated = store.update(record.id(), &update).await.unwrap();

    assert_eq!(updated.alt_text(), "Flag of Peru");
    assert_eq!(updated.folder(), "countries");
    assert_eq!(updated.url(), record.url());
    assert_eq!(updated.provider(), StorageProvider::Local);
    assert_eq!(store.get(record.id()).await.unwrap(), updated);
}

#[tokio::test]
async fn test_unknown_handle_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalObjectStore::open(temp_dir.path()).await.unwrap();

    let err = store.get_by_url("blob:medialib/unknown").await.unwrap_err();
    assert!(err.is_not_found());
}
