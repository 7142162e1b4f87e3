//! Upload orchestration for Google Drive.

use std::sync::Arc;

use tracing::debug;

use caslink_common::{Error, Provider, Result};

use crate::clients::BackendClients;
use crate::config::DriveConfig;
use crate::integrity::{DigestAlgorithm, DigestTag};
use crate::keys::derive_object_key;
use crate::types::{StorageLocator, StorageResult, UploadRequest};
use crate::verify;

use super::client::DriveApi;

/// Upload orchestrator for Google Drive.
pub struct DriveStore {
    client: Arc<dyn DriveApi>,
    config: DriveConfig,
}

impl DriveStore {
    /// Create a store over a caller-owned client.
    pub fn new(client: Arc<dyn DriveApi>, config: DriveConfig) -> Self {
        Self { client, config }
    }

    /// Upload `request` and return a verified [`StorageResult`].
    ///
    /// Drive has no content-addressed lookup, so there is no dedup probe
    /// and no write precondition: the file is created under the
    /// configured parents, granted the `anyone:reader` permission, and
    /// its shareable links fetched. The file name is the derived
    /// `<hash>.<ext>` leaf, so the returned `key` stays content-addressed
    /// like the other backends. Only existence and size can be
    /// re-confirmed afterwards.
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
        let file_name = derived.key.rsplit('/').next().unwrap_or(&derived.key);

        let file = self
            .client
            .create_file(
                file_name,
                &self.config.parent_folder_ids,
                &request.content_type,
                request.bytes.clone(),
                self.config.supports_all_drives,
            )
            .await?;
        debug!(file_id = %file.id, name = %file.name, "file created");

        self.client
            .grant_public_read(&file.id, self.config.supports_all_drives)
            .await?;
        let links = self
            .client
            .file_links(&file.id, self.config.supports_all_drives)
            .await?;

        let url = links
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", file.id));
        let download_url = links
            .web_content_link
            .unwrap_or_else(|| format!("https://drive.google.com/uc?id={}&export=download", file.id));

        let result = StorageResult {
            url,
            download_url,
            key: derived.key.clone(),
            digest_tag: Some(digest),
            size_bytes: Some(request.bytes.len() as u64),
            locator: Some(StorageLocator::Drive {
                file_id: file.id.clone(),
                supports_all_drives: self.config.supports_all_drives,
            }),
            provider: Some(Provider::Drive),
        };

        let clients = BackendClients::new().with_drive(self.client.clone());
        let outcome = verify::verify(&result.clone().into(), &clients).await?;
        verify::enforce_post_upload(
            &outcome,
            &derived.key,
            &derived.content_hash_hex,
            request.bytes.len() as u64,
            false,
        )?;
        debug!(file_id = %file.id, "upload verified");

        Ok(result)
    }
}
