//! S3-shaped bucket boundary and the aws-sdk-s3 adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use caslink_common::{Error, Result};

/// Metadata returned by a HEAD request.
#[derive(Debug, Clone, Default)]
pub struct ObjectHead {
    /// Reported content length.
    pub size_bytes: u64,
    /// Backend ETag, when present.
    pub etag: Option<String>,
    /// User metadata (`x-amz-meta-*`), keys lowercased by the backend.
    pub metadata: HashMap<String, String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Write parameters for a conditional PUT.
#[derive(Debug, Clone, Default)]
pub struct PutParams {
    /// MIME type stored with the object.
    pub content_type: String,
    /// Optional Cache-Control value stored with the object.
    pub cache_control: Option<String>,
    /// User metadata stored with the object.
    pub metadata: HashMap<String, String>,
    /// Send `If-None-Match: *` so the write only succeeds when the key
    /// is absent; the backend answers 412 when a concurrent writer won.
    pub if_none_match: bool,
}

/// Minimal S3-shaped surface the core needs.
///
/// Implementations map backend failures to [`Error::Backend`] carrying
/// the HTTP status, so adapters can classify the recognized not-found
/// (403/404) and race (412) sets; transport failures map to
/// [`Error::Network`].
#[async_trait]
pub trait BucketApi: Send + Sync {
    /// Metadata-only existence and metadata probe.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead>;

    /// Write an object, optionally guarded by an absence precondition.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        params: PutParams,
    ) -> Result<()>;

    /// Delete an object.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;
}

/// [`BucketApi`] over a caller-constructed [`aws_sdk_s3::Client`].
///
/// Endpoint, credentials and TLS are fixed by the caller when building
/// the inner client; R2 uses the account endpoint with the `auto`
/// region.
#[derive(Clone)]
pub struct S3BucketClient {
    inner: aws_sdk_s3::Client,
}

impl S3BucketClient {
    /// Wrap an already-configured SDK client.
    pub fn new(inner: aws_sdk_s3::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl BucketApi for S3BucketClient {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead> {
        let out = self
            .inner
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error("head_object", e))?;

        Ok(ObjectHead {
            size_bytes: out.content_length().unwrap_or(0).max(0) as u64,
            etag: out.e_tag().map(str::to_string),
            metadata: out.metadata().cloned().unwrap_or_default(),
            last_modified: out
                .last_modified()
                .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        params: PutParams,
    ) -> Result<()> {
        let mut request = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(&params.content_type);
        if let Some(cache_control) = &params.cache_control {
            request = request.cache_control(cache_control);
        }
        if !params.metadata.is_empty() {
            request = request.set_metadata(Some(params.metadata.clone()));
        }
        if params.if_none_match {
            request = request.if_none_match("*");
        }

        request
            .send()
            .await
            .map(|_| ())
            .map_err(|e| map_sdk_error("put_object", e))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| map_sdk_error("delete_object", e))
    }
}

/// Fold an SDK error into the common taxonomy, preserving the backend
/// HTTP status when one was produced.
fn map_sdk_error<E>(op: &str, err: SdkError<E>) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let message = format!("{}: {}", op, DisplayErrorContext(err));
    match status {
        Some(status) => Error::Backend { status, message },
        None => Error::Network(message),
    }
}
