//! Content-addressed upload orchestration for R2.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use caslink_common::{Error, Provider, Result};

use crate::clients::BackendClients;
use crate::config::R2Config;
use crate::integrity::{DigestAlgorithm, DigestTag, CONTENT_DIGEST_METADATA_KEY};
use crate::keys::derive_object_key;
use crate::types::{StorageLocator, StorageResult, UploadRequest, WriteOutcome};
use crate::verify;

use super::client::{BucketApi, ObjectHead, PutParams};

/// Upload orchestrator for an R2 bucket.
pub struct R2Store {
    client: Arc<dyn BucketApi>,
    config: R2Config,
}

impl R2Store {
    /// Create a store over a caller-owned client.
    pub fn new(client: Arc<dyn BucketApi>, config: R2Config) -> Self {
        Self { client, config }
    }

    /// Upload `request` and return a verified [`StorageResult`].
    ///
    /// Sequence: derive key and digest from the bytes, probe for an
    /// existing object with the same digest (pure deduplication, no
    /// write and no bytes transferred), otherwise write guarded by an
    /// absence precondition (a lost race counts as success), then
    /// re-confirm existence, digest and size through backend metadata
    /// before returning.
    pub async fn upload(&self, request: &UploadRequest) -> Result<StorageResult> {
        if request.bytes.is_empty() {
            return Err(Error::InvalidInput("no content bytes supplied".to_string()));
        }

        let derived = derive_object_key(
            &request.path_prefix,
            &request.filename,
            &request.bytes,
            true,
        );
        let digest = DigestTag::compute(DigestAlgorithm::Sha256, &request.bytes);
        let digest_hex = digest.to_hex();

        let already_stored = match self.probe(&derived.key).await? {
            Some(head) => head
                .metadata
                .get(CONTENT_DIGEST_METADATA_KEY)
                .is_some_and(|stored| stored.eq_ignore_ascii_case(&digest_hex)),
            None => false,
        };

        if already_stored {
            debug!(key = %derived.key, "existing object matches content digest, skipping write");
        } else {
            match self.write_if_absent(&derived.key, request, &digest_hex).await? {
                WriteOutcome::Written => debug!(key = %derived.key, "object written"),
                WriteOutcome::RaceDetected => {
                    debug!(key = %derived.key, "lost write race, deferring to verification");
                }
            }
        }

        let result = StorageResult {
            url: self.config.public_url(&derived.key),
            download_url: self.config.public_url(&derived.key),
            key: derived.key.clone(),
            digest_tag: Some(digest),
            size_bytes: Some(request.bytes.len() as u64),
            locator: Some(StorageLocator::R2 {
                bucket: self.config.bucket.clone(),
                key: derived.key.clone(),
            }),
            provider: Some(Provider::R2),
        };

        let clients = BackendClients::new().with_r2(self.client.clone());
        let outcome = verify::verify(&result.clone().into(), &clients).await?;
        verify::enforce_post_upload(
            &outcome,
            &derived.key,
            &digest_hex,
            request.bytes.len() as u64,
            true,
        )?;
        debug!(key = %derived.key, "upload verified");

        Ok(result)
    }

    /// Metadata-only existence probe. 403/404 map to "absent"; any other
    /// backend failure propagates unchanged.
    async fn probe(&self, key: &str) -> Result<Option<ObjectHead>> {
        match self.client.head_object(&self.config.bucket, key).await {
            Ok(head) => Ok(Some(head)),
            Err(err) if matches!(err.status(), Some(403 | 404)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// PUT guarded by `If-None-Match: *`. A 412 means a concurrent
    /// writer already created the key; not a failure here.
    async fn write_if_absent(
        &self,
        key: &str,
        request: &UploadRequest,
        digest_hex: &str,
    ) -> Result<WriteOutcome> {
        let mut metadata = HashMap::new();
        metadata.insert(
            CONTENT_DIGEST_METADATA_KEY.to_string(),
            digest_hex.to_string(),
        );
        let params = PutParams {
            content_type: request.content_type.clone(),
            cache_control: request.cache_control.clone(),
            metadata,
            if_none_match: true,
        };

        match self
            .client
            .put_object(&self.config.bucket, key, request.bytes.clone(), params)
            .await
        {
            Ok(()) => Ok(WriteOutcome::Written),
            Err(err) if err.status() == Some(412) => Ok(WriteOutcome::RaceDetected),
            Err(err) => Err(err),
        }
    }
}
