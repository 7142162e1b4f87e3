//! Content-addressed upload orchestration for Firebase Storage.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use caslink_common::{Error, Provider, Result};

use crate::clients::BackendClients;
use crate::config::FirebaseConfig;
use crate::integrity::{DigestAlgorithm, DigestTag, CONTENT_DIGEST_METADATA_KEY};
use crate::keys::derive_object_key;
use crate::types::{StorageLocator, StorageResult, UploadRequest, WriteOutcome};
use crate::verify;

use super::client::{GcsApi, GcsInsertParams, GcsObject};

/// Upload orchestrator for the GCS bucket backing Firebase Storage.
pub struct FirebaseStore {
    client: Arc<dyn GcsApi>,
    config: FirebaseConfig,
}

impl FirebaseStore {
    /// Create a store over a caller-owned client.
    pub fn new(client: Arc<dyn GcsApi>, config: FirebaseConfig) -> Self {
        Self { client, config }
    }

    /// Upload `request` and return a verified [`StorageResult`].
    ///
    /// Same sequence as the R2 store; after an actual write the object
    /// is additionally made publicly readable. On a lost precondition
    /// race the winning writer owns the ACL grant, so that step is
    /// skipped and verification is relied on instead.
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
            Some(object) => object
                .metadata
                .as_ref()
                .and_then(|m| m.get(CONTENT_DIGEST_METADATA_KEY))
                .is_some_and(|stored| stored.eq_ignore_ascii_case(&digest_hex)),
            None => false,
        };

        if already_stored {
            debug!(object = %derived.key, "existing object matches content digest, skipping write");
        } else {
            match self.write_if_absent(&derived.key, request, &digest_hex).await? {
                WriteOutcome::Written => {
                    self.client
                        .make_public(&self.config.bucket, &derived.key)
                        .await?;
                    debug!(object = %derived.key, "object written and published");
                }
                WriteOutcome::RaceDetected => {
                    debug!(object = %derived.key, "lost write race, deferring to verification");
                }
            }
        }

        let result = StorageResult {
            url: self.config.public_url(&derived.key),
            download_url: self.config.download_url(&derived.key),
            key: derived.key.clone(),
            digest_tag: Some(digest),
            size_bytes: Some(request.bytes.len() as u64),
            locator: Some(StorageLocator::Firebase {
                bucket: self.config.bucket.clone(),
                object_path: derived.key.clone(),
            }),
            provider: Some(Provider::Firebase),
        };

        let clients = BackendClients::new().with_firebase(self.client.clone());
        let outcome = verify::verify(&result.clone().into(), &clients).await?;
        verify::enforce_post_upload(
            &outcome,
            &derived.key,
            &digest_hex,
            request.bytes.len() as u64,
            true,
        )?;
        debug!(object = %derived.key, "upload verified");

        Ok(result)
    }

    /// Existence check followed by a metadata fetch. An object that
    /// vanishes between the two calls counts as absent.
    async fn probe(&self, name: &str) -> Result<Option<GcsObject>> {
        if !self.client.object_exists(&self.config.bucket, name).await? {
            return Ok(None);
        }
        match self.client.get_object(&self.config.bucket, name).await {
            Ok(object) => Ok(Some(object)),
            Err(err) if err.status() == Some(404) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Insert guarded by `ifGenerationMatch=0`; 412 means a concurrent
    /// writer already created the object.
    async fn write_if_absent(
        &self,
        name: &str,
        request: &UploadRequest,
        digest_hex: &str,
    ) -> Result<WriteOutcome> {
        let mut metadata = HashMap::new();
        metadata.insert(
            CONTENT_DIGEST_METADATA_KEY.to_string(),
            digest_hex.to_string(),
        );
        let params = GcsInsertParams {
            content_type: request.content_type.clone(),
            cache_control: request.cache_control.clone(),
            metadata,
            if_absent: true,
        };

        match self
            .client
            .insert_object(&self.config.bucket, name, request.bytes.clone(), params)
            .await
        {
            Ok(_) => Ok(WriteOutcome::Written),
            Err(err) if err.status() == Some(412) => Ok(WriteOutcome::RaceDetected),
            Err(err) => Err(err),
        }
    }
}
