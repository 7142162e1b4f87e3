//! Google Drive API client boundary.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use caslink_common::{Error, Result};

use crate::auth::AccessTokenProvider;
use crate::http::{handle_json, handle_status};

/// Google Drive API base URL.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
/// Google Drive upload API base URL.
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Metadata fields requested on every file call.
const FILE_FIELDS: &str =
    "id,name,mimeType,size,md5Checksum,modifiedTime,parents,webViewLink,webContentLink,trashed";

/// Multipart boundary for metadata+media uploads.
const MULTIPART_BOUNDARY: &str = "caslink_boundary";

/// Google Drive file metadata from the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID.
    pub id: String,
    /// File name.
    pub name: String,
    /// MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// File size in bytes; the API serializes it as a string.
    #[serde(default)]
    pub size: Option<String>,
    /// Legacy checksum; not comparable to the sha-256 content tag.
    #[serde(default)]
    pub md5_checksum: Option<String>,
    /// Modified time.
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
    /// Parent folder IDs.
    #[serde(default)]
    pub parents: Vec<String>,
    /// Browser-viewable link.
    #[serde(default)]
    pub web_view_link: Option<String>,
    /// Direct-download link.
    #[serde(default)]
    pub web_content_link: Option<String>,
    /// Trashed status.
    #[serde(default)]
    pub trashed: bool,
}

impl DriveFile {
    /// Get size as u64.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_ref().and_then(|s| s.parse().ok())
    }
}

/// Shareable links of a published file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveLinks {
    #[serde(default)]
    pub web_view_link: Option<String>,
    #[serde(default)]
    pub web_content_link: Option<String>,
}

/// Minimal Drive v3 surface the core needs. [`Error::Backend`] carries
/// the HTTP status for the recognized 403/404 classification.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Fetch file metadata by ID (size and checksum fields included).
    async fn get_file(&self, file_id: &str, supports_all_drives: bool) -> Result<DriveFile>;

    /// Create a file under `parents` via a multipart upload.
    async fn create_file(
        &self,
        name: &str,
        parents: &[String],
        content_type: &str,
        data: Bytes,
        supports_all_drives: bool,
    ) -> Result<DriveFile>;

    /// Grant the `anyone:reader` permission.
    async fn grant_public_read(&self, file_id: &str, supports_all_drives: bool) -> Result<()>;

    /// Fetch the shareable links.
    async fn file_links(&self, file_id: &str, supports_all_drives: bool) -> Result<DriveLinks>;

    /// Delete the file.
    async fn delete_file(&self, file_id: &str, supports_all_drives: bool) -> Result<()>;
}

/// Google Drive API client.
pub struct HttpDriveClient {
    http: Client,
    token: Arc<dyn AccessTokenProvider>,
    api_base: String,
    upload_base: String,
}

impl HttpDriveClient {
    /// Create a client against the production endpoints.
    pub fn new(token: Arc<dyn AccessTokenProvider>) -> Self {
        Self::with_endpoints(token, DRIVE_API_BASE, DRIVE_UPLOAD_BASE)
    }

    /// Create a client against custom endpoints (tests).
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

    fn shared_drive_query(supports_all_drives: bool) -> &'static [(&'static str, &'static str)] {
        if supports_all_drives {
            &[("supportsAllDrives", "true")]
        } else {
            &[]
        }
    }
}

#[async_trait]
impl DriveApi for HttpDriveClient {
    async fn get_file(&self, file_id: &str, supports_all_drives: bool) -> Result<DriveFile> {
        let url = format!("{}/files/{}", self.api_base, file_id);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, auth)
            .query(&[("fields", FILE_FIELDS)])
            .query(Self::shared_drive_query(supports_all_drives))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to get file: {}", e)))?;

        handle_json("get_file", response).await
    }

    async fn create_file(
        &self,
        name: &str,
        parents: &[String],
        content_type: &str,
        data: Bytes,
        supports_all_drives: bool,
    ) -> Result<DriveFile> {
        let url = format!("{}/files?uploadType=multipart", self.upload_base);
        let auth = self.auth_header().await?;

        let metadata = serde_json::json!({
            "name": name,
            "parents": parents,
        });
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| Error::Serialization(format!("Failed to serialize metadata: {}", e)))?;

        // Build multipart/related request: metadata part, then media part.
        let mut body = Vec::with_capacity(data.len() + metadata_json.len() + 256);
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.extend_from_slice(metadata_json.as_bytes());
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(&data);
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("--{}--", MULTIPART_BOUNDARY).as_bytes());

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, auth)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
            )
            .query(&[("fields", FILE_FIELDS)])
            .query(Self::shared_drive_query(supports_all_drives))
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to upload file: {}", e)))?;

        handle_json("create_file", response).await
    }

    async fn grant_public_read(&self, file_id: &str, supports_all_drives: bool) -> Result<()> {
        let url = format!("{}/files/{}/permissions", self.api_base, file_id);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, auth)
            .query(Self::shared_drive_query(supports_all_drives))
            .json(&serde_json::json!({
                "role": "reader",
                "type": "anyone",
            }))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to grant permission: {}", e)))?;

        handle_status("grant_public_read", response).await
    }

    async fn file_links(&self, file_id: &str, supports_all_drives: bool) -> Result<DriveLinks> {
        let url = format!("{}/files/{}", self.api_base, file_id);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, auth)
            .query(&[("fields", "webViewLink,webContentLink")])
            .query(Self::shared_drive_query(supports_all_drives))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to get links: {}", e)))?;

        handle_json("file_links", response).await
    }

    async fn delete_file(&self, file_id: &str, supports_all_drives: bool) -> Result<()> {
        let url = format!("{}/files/{}", self.api_base, file_id);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .delete(&url)
            .header(header::AUTHORIZATION, auth)
            .query(Self::shared_drive_query(supports_all_drives))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to delete file: {}", e)))?;

        handle_status("delete_file", response).await
    }
}
