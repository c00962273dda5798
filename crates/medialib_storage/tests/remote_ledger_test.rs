//! Tests for the PostgREST-backed remote ledger.

use chrono::{TimeZone, Utc};
use medialib_core::{ListOptions, MediaMetadata, MediaRecord, StorageProvider, SupabaseSettings};
use medialib_error::StorageErrorKind;
use medialib_storage::{PostgrestLedger, RemoteLedger};
use wiremock::matchers::{body_string_contains, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ledger(server: &MockServer) -> PostgrestLedger {
    PostgrestLedger::new(
        &SupabaseSettings::default()
            .with_url(server.uri())
            .with_anon_key("anon-key"),
    )
    .unwrap()
}

fn record() -> MediaRecord {
    MediaRecord::builder()
        .id("4e0c")
        .filename("jp.svg")
        .url("https://cdn.example.com/flags/jp.svg")
        .mime_type("image/svg+xml")
        .size_bytes(512u64)
        .created_at(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap())
        .alt_text("Flag of Japan")
        .metadata(MediaMetadata::new(StorageProvider::Netlify, "flags", "flags/jp.svg"))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_select_sends_filters_and_parses_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cms_media"))
        .and(header("apikey", "anon-key"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("metadata->>folder", "eq.flags"))
        .and(query_param("mime_type", "like.image/*"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "4e0c",
                "filename": "jp.svg",
                "url": "https://cdn.example.com/flags/jp.svg",
                "mime_type": "image/svg+xml",
                "size_bytes": 512,
                "created_at": "2024-05-01T08:30:00+00:00",
                "alt_text": null,
                "metadata": { "storageProvider": "netlify", "folder": "flags" }
            },
            {
                "id": "legacy",
                "filename": "old.png",
                "url": "https://cdn.example.com/old.png",
                "mime_type": "image/png",
                "size_bytes": 1,
                "created_at": "2023-01-01T00:00:00+00:00",
                "metadata": {}
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let options = ListOptions::default()
        .with_folder("flags")
        .with_mime_prefix("image/")
        .with_limit(5usize);
    let records = ledger(&server).select(&options).await.unwrap();

    assert_eq!(records.len(), 1);
    let jp = &records[0];
    assert_eq!(jp.provider(), StorageProvider::Netlify);
    assert_eq!(jp.folder(), "flags");
    assert_eq!(jp.metadata().storage_path(), "flags/jp.svg");
    assert_eq!(jp.alt_text(), "jp");
}

#[tokio::test]
async fn test_upsert_merges_on_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/cms_media"))
        .and(query_param("on_conflict", "url"))
        .and(header_exists("prefer"))
        .and(header("authorization", "Bearer anon-key"))
        .and(body_string_contains("\"storageProvider\":\"netlify\""))
        .and(body_string_contains("\"alt_text\":\"Flag of Japan\""))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    ledger(&server).upsert(&record()).await.unwrap();
}

#[tokio::test]
async fn test_update_patches_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/cms_media"))
        .and(query_param("id", "eq.4e0c"))
        .and(body_string_contains("Flag of Japan"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    ledger(&server).update(&record()).await.unwrap();
}

#[tokio::test]
async fn test_delete_by_url() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/cms_media"))
        .and(query_param("url", "eq.https://cdn.example.com/flags/jp.svg"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    ledger(&server)
        .delete_by_url("https://cdn.example.com/flags/jp.svg")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_find_by_url_returns_first_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("url", "eq.https://cdn.example.com/flags/jp.svg"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": "4e0c",
            "filename": "jp.svg",
            "url": "https://cdn.example.com/flags/jp.svg",
            "mime_type": "image/svg+xml",
            "size_bytes": 512,
            "created_at": "2024-05-01T08:30:00Z",
            "metadata": { "storageProvider": "netlify", "folder": "flags", "storagePath": "flags/jp.svg" }
        }])))
        .mount(&server)
        .await;

    let found = ledger(&server)
        .find_by_url("https://cdn.example.com/flags/jp.svg")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), "4e0c");
}

#[tokio::test]
async fn test_find_by_id_filters_on_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cms_media"))
        .and(query_param("id", "eq.4e0c"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": "4e0c",
            "filename": "jp.svg",
            "url": "https://cdn.example.com/flags/jp.svg",
            "mime_type": "image/svg+xml",
            "size_bytes": 512,
            "created_at": "2024-05-01T08:30:00Z",
            "metadata": { "storageProvider": "netlify", "folder": "flags", "storagePath": "flags/jp.svg" }
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cms_media"))
        .and(query_param("id", "eq.missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let found = ledger(&server).find_by_id("4e0c").await.unwrap().unwrap();
    assert_eq!(found.url(), "https://cdn.example.com/flags/jp.svg");
    assert_eq!(found.provider(), StorageProvider::Netlify);

    assert!(ledger(&server).find_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_write_is_ledger_write_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
        .mount(&server)
        .await;

    let err = ledger(&server).upsert(&record()).await.unwrap_err();
    assert!(matches!(err.kind(), StorageErrorKind::LedgerWrite(_)));
}

#[tokio::test]
async fn test_missing_settings_rejected() {
    let err = PostgrestLedger::new(&SupabaseSettings::default()).unwrap_err();
    assert!(matches!(err.kind(), StorageErrorKind::Configuration(_)));
}
