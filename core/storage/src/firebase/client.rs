//! GCS JSON API client boundary.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};

use caslink_common::{Error, Result};

use crate::auth::AccessTokenProvider;
use crate::http::{backend_error, handle_json, handle_status};

/// GCS JSON API base URL.
const STORAGE_API_BASE: &str = "https://storage.googleapis.com/storage/v1";
/// GCS JSON upload API base URL.
const STORAGE_UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";

/// Multipart boundary for metadata+media uploads.
const MULTIPART_BOUNDARY: &str = "caslink_boundary";

/// Object resource returned by the JSON API.
///
/// Numeric fields arrive as strings on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsObject {
    /// Object name (full path within the bucket).
    pub name: String,
    /// Bucket holding the object.
    pub bucket: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub cache_control: Option<String>,
    /// Live generation number.
    #[serde(default)]
    pub generation: Option<String>,
    /// Custom metadata written at upload time.
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl GcsObject {
    /// Get size as u64.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_ref().and_then(|s| s.parse().ok())
    }
}

/// Insert parameters for a conditional object upload.
#[derive(Debug, Clone, Default)]
pub struct GcsInsertParams {
    /// MIME type stored with the object.
    pub content_type: String,
    /// Optional Cache-Control value stored with the object.
    pub cache_control: Option<String>,
    /// Custom metadata stored with the object.
    pub metadata: HashMap<String, String>,
    /// Send `ifGenerationMatch=0` so the write only succeeds when no
    /// live object exists; the backend answers 412 otherwise.
    pub if_absent: bool,
}

/// Minimal GCS surface the core needs. [`Error::Backend`] carries the
/// HTTP status for the recognized 404/412 classification.
#[async_trait]
pub trait GcsApi: Send + Sync {
    /// Whether a live object exists at `name`.
    async fn object_exists(&self, bucket: &str, name: &str) -> Result<bool>;

    /// Fetch the object resource (metadata only, never bytes).
    async fn get_object(&self, bucket: &str, name: &str) -> Result<GcsObject>;

    /// Upload bytes with metadata, optionally guarded by
    /// `ifGenerationMatch=0`.
    async fn insert_object(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        params: GcsInsertParams,
    ) -> Result<GcsObject>;

    /// Grant `allUsers` the READER role on the object.
    async fn make_public(&self, bucket: &str, name: &str) -> Result<()>;

    /// Delete the object.
    async fn delete_object(&self, bucket: &str, name: &str) -> Result<()>;
}

/// GCS JSON API client.
pub struct HttpGcsClient {
    http: Client,
    token: Arc<dyn AccessTokenProvider>,
    api_base: String,
    upload_base: String,
}

impl HttpGcsClient {
    /// Create a client against the production endpoints.
    pub fn new(token: Arc<dyn AccessTokenProvider>) -> Self {
        Self::with_endpoints(token, STORAGE_API_BASE, STORAGE_UPLOAD_BASE)
    }

    /// Create a client against custom endpoints (emulator, tests).
    pub fn with_endpoints(
        token: Arc<dyn AccessTokenProvider>,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
    ) -> Self {
        let http = Client::builder()
            .user_agent("caslink/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            token,
            api_base: api_base.into(),
            upload_base: upload_base.into(),
        }
    }

    /// Get authorization header.
    async fn auth_header(&self) -> Result<String> {
        let token = self.token.access_token().await?;
        Ok(format!("Bearer {}", token))
    }

    fn object_url(&self, bucket: &str, name: &str) -> String {
        format!(
            "{}/b/{}/o/{}",
            self.api_base,
            bucket,
            utf8_percent_encode(name, NON_ALPHANUMERIC)
        )
    }
}

#[async_trait]
impl GcsApi for HttpGcsClient {
    async fn object_exists(&self, bucket: &str, name: &str) -> Result<bool> {
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(self.object_url(bucket, name))
            .header(header::AUTHORIZATION, auth)
            .query(&[("fields", "name")])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to check object: {}", e)))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(backend_error("object_exists", response).await),
        }
    }

    async fn get_object(&self, bucket: &str, name: &str) -> Result<GcsObject> {
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(self.object_url(bucket, name))
            .header(header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to get object: {}", e)))?;

        handle_json("get_object", response).await
    }

    async fn insert_object(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        params: GcsInsertParams,
    ) -> Result<GcsObject> {
        let auth = self.auth_header().await?;
        let url = format!("{}/b/{}/o", self.upload_base, bucket);

        let mut resource = serde_json::Map::new();
        resource.insert("name".to_string(), serde_json::json!(name));
        resource.insert(
            "contentType".to_string(),
            serde_json::json!(params.content_type),
        );
        if let Some(cache_control) = &params.cache_control {
            resource.insert("cacheControl".to_string(), serde_json::json!(cache_control));
        }
        if !params.metadata.is_empty() {
            resource.insert("metadata".to_string(), serde_json::json!(params.metadata));
        }
        let metadata_json = serde_json::to_string(&resource)
            .map_err(|e| Error::Serialization(format!("Failed to serialize resource: {}", e)))?;

        // Build multipart/related request: metadata part, then media part.
        let mut body = Vec::with_capacity(data.len() + metadata_json.len() + 256);
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.extend_from_slice(metadata_json.as_bytes());
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", params.content_type).as_bytes());
        body.extend_from_slice(&data);
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("--{}--", MULTIPART_BOUNDARY).as_bytes());

        let mut request = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, auth)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
            )
            .query(&[("uploadType", "multipart")]);
        if params.if_absent {
            request = request.query(&[("ifGenerationMatch", "0")]);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to upload object: {}", e)))?;

        handle_json("insert_object", response).await
    }

    async fn make_public(&self, bucket: &str, name: &str) -> Result<()> {
        let auth = self.auth_header().await?;
        let url = format!("{}/acl", self.object_url(bucket, name));

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, auth)
            .json(&serde_json::json!({
                "entity": "allUsers",
                "role": "READER",
            }))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to grant public read: {}", e)))?;

        handle_status("make_public", response).await
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<()> {
        let auth = self.auth_header().await?;

        let response = self
            .http
            .delete(self.object_url(bucket, name))
            .header(header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to delete object: {}", e)))?;

        handle_status("delete_object", response).await
    }
}
