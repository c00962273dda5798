//! Tests for the bucket adapter against a mock storage API.

use chrono::Utc;
use medialib_core::{
    MediaBlob, MediaMetadata, MediaRecord, ProgressReporter, StorageProvider, SupabaseSettings,
};
use medialib_error::StorageErrorKind;
use medialib_storage::{MediaBackend, SupabaseBucket, UploadRequest};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bucket(server: &MockServer) -> SupabaseBucket {
    SupabaseBucket::new(
        SupabaseSettings::default()
            .with_url(server.uri())
            .with_anon_key("anon-key"),
    )
}

fn bucket_record(url: String) -> MediaRecord {
    MediaRecord::builder()
        .id("7c1e")
        .filename("hero.jpg")
        .url(url)
        .mime_type("image/jpeg")
        .size_bytes(2u64)
        .created_at(Utc::now())
        .metadata(MediaMetadata::new(
            StorageProvider::Supabase,
            "banners",
            "banners/hero.jpg",
        ))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_upload_returns_public_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/media/banners/hero.jpg"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .and(header("x-upsert", "true"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Key": "media/banners/hero.jpg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let blob = MediaBlob::new("hero.jpg", "image/jpeg", vec![9, 9]);
    let request = UploadRequest::new(&blob, "banners", "hero.jpg", None, Utc::now());
    let progress = ProgressReporter::silent();
    let record = bucket(&server).upload(&request, &progress).await.unwrap();

    assert_eq!(
        record.url(),
        &format!("{}/storage/v1/object/public/media/banners/hero.jpg", server.uri())
    );
    assert_eq!(record.provider(), StorageProvider::Supabase);
    assert_eq!(record.folder(), "banners");
    assert_eq!(progress.last_reported(), Some(90));
}

#[tokio::test]
async fn test_unconfigured_bucket_is_configuration_error() {
    let adapter = SupabaseBucket::new(SupabaseSettings::default());
    assert!(matches!(
        adapter.ensure_available().unwrap_err().kind(),
        StorageErrorKind::Configuration(_)
    ));
}

#[tokio::test]
async fn test_delete_sends_prefixes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/media"))
        .and(body_json(serde_json::json!({ "prefixes": ["banners/hero.jpg"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "banners/hero.jpg" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = bucket(&server);
    let url = adapter.public_url("banners/hero.jpg").unwrap();
    adapter.delete(&bucket_record(url)).await.unwrap();
}

#[tokio::test]
async fn test_delete_of_missing_object_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let adapter = bucket(&server);
    let url = adapter.public_url("banners/hero.jpg").unwrap();
    let err = adapter.delete(&bucket_record(url)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_requires_resolvable_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let record = bucket_record("https://elsewhere.example.com/hero.jpg".to_string());
    let err = bucket(&server).delete(&record).await.unwrap_err();
    assert!(matches!(err.kind(), StorageErrorKind::Precondition(_)));
}

#[tokio::test]
async fn test_delete_server_error_is_transfer_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let adapter = bucket(&server);
    let url = adapter.public_url("banners/hero.jpg").unwrap();
    let err = adapter.delete(&bucket_record(url)).await.unwrap_err();
    assert!(matches!(err.kind(), StorageErrorKind::Transfer { .. }));
}
