//! Wire-level tests for the HTTP clients against mock servers: request
//! construction (multipart bodies, precondition params, ACL grants) and
//! status mapping, without touching live backends.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use caslink_storage::auth::StaticTokenProvider;
use caslink_storage::firebase::{GcsApi, GcsInsertParams, HttpGcsClient};
use caslink_storage::gdrive::{DriveApi, HttpDriveClient};
use caslink_storage::r2::{BucketApi, PutParams, S3BucketClient};

fn gcs_client(server: &MockServer) -> HttpGcsClient {
    HttpGcsClient::with_endpoints(
        Arc::new(StaticTokenProvider::new("test-token")),
        format!("{}/storage/v1", server.uri()),
        format!("{}/upload/storage/v1", server.uri()),
    )
}

fn drive_client(server: &MockServer) -> HttpDriveClient {
    HttpDriveClient::with_endpoints(
        Arc::new(StaticTokenProvider::new("test-token")),
        format!("{}/drive/v3", server.uri()),
        format!("{}/upload/drive/v3", server.uri()),
    )
}

fn s3_client(server: &MockServer) -> S3BucketClient {
    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
        .region(aws_sdk_s3::config::Region::new("auto"))
        .endpoint_url(server.uri())
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            "test", "test", None, None, "static",
        ))
        .force_path_style(true)
        .build();
    S3BucketClient::new(aws_sdk_s3::Client::from_conf(config))
}

// ── GCS client ──────────────────────────────────────────────────────────

#[tokio::test]
async fn gcs_get_object_parses_resource() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/storage/v1/b/bkt/o/media.2Fabc$|^/storage/v1/b/bkt/o/media/abc$"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "media/abc",
            "bucket": "bkt",
            "size": "11",
            "contentType": "text/plain",
            "generation": "1700000000000000",
            "metadata": { "content-sha256": "afa27b44" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let object = gcs_client(&server).get_object("bkt", "media/abc").await.unwrap();
    assert_eq!(object.size_bytes(), Some(11));
    assert_eq!(
        object.metadata.unwrap().get("content-sha256").unwrap(),
        "afa27b44"
    );
}

#[tokio::test]
async fn gcs_get_object_maps_404_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/storage/v1/b/bkt/o/media.2Fabc$|^/storage/v1/b/bkt/o/media/abc$"))
        .respond_with(ResponseTemplate::new(404).set_body_string("No such object"))
        .mount(&server)
        .await;

    let err = gcs_client(&server)
        .get_object("bkt", "media/abc")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn gcs_object_exists_maps_404_to_false() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/storage/v1/b/bkt/o/media.2Fabc$|^/storage/v1/b/bkt/o/media/abc$"))
        .and(query_param("fields", "name"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let exists = gcs_client(&server)
        .object_exists("bkt", "media/abc")
        .await
        .unwrap();
    assert!(!exists);
}

#[tokio::test]
async fn gcs_insert_sends_precondition_and_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/bkt/o"))
        .and(query_param("uploadType", "multipart"))
        .and(query_param("ifGenerationMatch", "0"))
        .and(body_string_contains("content-sha256"))
        .and(body_string_contains("hello-world"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "media/abc",
            "bucket": "bkt",
            "size": "11"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut metadata = HashMap::new();
    metadata.insert("content-sha256".to_string(), "afa27b44".to_string());
    let object = gcs_client(&server)
        .insert_object(
            "bkt",
            "media/abc",
            Bytes::from_static(b"hello-world"),
            GcsInsertParams {
                content_type: "text/plain".to_string(),
                cache_control: None,
                metadata,
                if_absent: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(object.name, "media/abc");
}

#[tokio::test]
async fn gcs_insert_maps_412_race() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/bkt/o"))
        .respond_with(ResponseTemplate::new(412).set_body_string("conditionNotMet"))
        .mount(&server)
        .await;

    let err = gcs_client(&server)
        .insert_object(
            "bkt",
            "media/abc",
            Bytes::from_static(b"hello-world"),
            GcsInsertParams {
                content_type: "text/plain".to_string(),
                if_absent: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(412));
}

#[tokio::test]
async fn gcs_make_public_posts_acl_entry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/b/bkt/o/media.*/?acl$"))
        .and(body_string_contains("allUsers"))
        .and(body_string_contains("READER"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "entity": "allUsers",
            "role": "READER"
        })))
        .expect(1)
        .mount(&server)
        .await;

    gcs_client(&server).make_public("bkt", "media/abc").await.unwrap();
}

// ── Drive client ────────────────────────────────────────────────────────

#[tokio::test]
async fn drive_get_file_requests_checksum_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/f123"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "f123",
            "name": "abc.txt",
            "mimeType": "text/plain",
            "size": "11",
            "md5Checksum": "9f1a2c3d4e5f67890123456789abcdef",
            "trashed": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = drive_client(&server).get_file("f123", false).await.unwrap();
    assert_eq!(file.size_bytes(), Some(11));
    assert!(!file.trashed);
}

#[tokio::test]
async fn drive_get_file_passes_shared_drive_flag() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/f123"))
        .and(query_param("supportsAllDrives", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "f123",
            "name": "abc.txt"
        })))
        .expect(1)
        .mount(&server)
        .await;

    drive_client(&server).get_file("f123", true).await.unwrap();
}

#[tokio::test]
async fn drive_create_file_uploads_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(query_param("uploadType", "multipart"))
        .and(body_string_contains("\"parents\":[\"folder-1\"]"))
        .and(body_string_contains("hello-world"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "f123",
            "name": "abc.txt",
            "size": "11"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = drive_client(&server)
        .create_file(
            "abc.txt",
            &["folder-1".to_string()],
            "text/plain",
            Bytes::from_static(b"hello-world"),
            false,
        )
        .await
        .unwrap();
    assert_eq!(file.id, "f123");
}

#[tokio::test]
async fn drive_grant_public_read_creates_anyone_permission() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/drive/v3/files/f123/permissions"))
        .and(body_string_contains("reader"))
        .and(body_string_contains("anyone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "perm-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    drive_client(&server)
        .grant_public_read("f123", false)
        .await
        .unwrap();
}

#[tokio::test]
async fn drive_delete_file_accepts_no_content() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/drive/v3/files/f123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    drive_client(&server).delete_file("f123", false).await.unwrap();
}

#[tokio::test]
async fn drive_get_file_maps_404_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("File not found"))
        .mount(&server)
        .await;

    let err = drive_client(&server).get_file("missing", false).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

// ── S3 client ───────────────────────────────────────────────────────────

#[tokio::test]
async fn s3_head_object_maps_404_status() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/assets/media/abc.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = s3_client(&server)
        .head_object("assets", "media/abc.txt")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn s3_put_object_sends_absence_precondition() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/assets/media/abc.txt"))
        .and(header("if-none-match", "*"))
        .respond_with(ResponseTemplate::new(412))
        .expect(1)
        .mount(&server)
        .await;

    let err = s3_client(&server)
        .put_object(
            "assets",
            "media/abc.txt",
            Bytes::from_static(b"hello-world"),
            PutParams {
                content_type: "text/plain".to_string(),
                if_none_match: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(412));
}
