//! Value types exchanged between the stores, the verifier and callers.
//!
//! All of these are plain immutable values: a result or locator is built
//! once at upload completion and treated as an opaque reference
//! afterwards.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use caslink_common::Provider;

use crate::integrity::DigestTag;

/// Identifies exactly where an object lives.
///
/// A closed, provider-tagged reference. Adding a backend adds a variant
/// here, which forces every dispatch site to be revisited at compile
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum StorageLocator {
    /// An object in an R2 (S3-compatible) bucket.
    R2 { bucket: String, key: String },
    /// An object in the GCS bucket backing Firebase Storage.
    Firebase { bucket: String, object_path: String },
    /// A Google Drive file.
    Drive {
        file_id: String,
        #[serde(default)]
        supports_all_drives: bool,
    },
}

impl StorageLocator {
    /// Backend this locator points at.
    pub fn provider(&self) -> Provider {
        match self {
            StorageLocator::R2 { .. } => Provider::R2,
            StorageLocator::Firebase { .. } => Provider::Firebase,
            StorageLocator::Drive { .. } => Provider::Drive,
        }
    }
}

/// Reference returned by a successful upload. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageResult {
    /// Public URL of the object.
    pub url: String,
    /// Direct-download URL (may equal `url`).
    pub download_url: String,
    /// Derived storage key.
    pub key: String,
    /// Content digest tag, present once integrity is established.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_tag: Option<DigestTag>,
    /// Content size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Locator for later verification and deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<StorageLocator>,
    /// Backend that served the upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
}

/// Tri-state integrity comparison result.
///
/// `Indeterminate` is a first-class value, not a null: the backend
/// cannot, or was not asked to, expose a comparable digest. It is
/// distinct from `Mismatch`, which records an observed inequality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityStatus {
    Match,
    Mismatch,
    Indeterminate,
}

impl IntegrityStatus {
    /// Whether the stored digest was positively confirmed.
    pub fn is_match(&self) -> bool {
        matches!(self, IntegrityStatus::Match)
    }
}

/// Outcome of a metadata-only verification call.
///
/// Produced fresh on every call; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    /// Whether the object could be found at its locator.
    pub exists: bool,
    /// Digest comparison result.
    pub integrity: IntegrityStatus,
    /// Size comparison; unset when no expected size was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_matches: Option<bool>,
    /// Human-readable note on how the outcome was reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl VerifyOutcome {
    /// Outcome for an object that could not be found or reached.
    pub(crate) fn absent(details: Option<String>) -> Self {
        Self {
            exists: false,
            integrity: IntegrityStatus::Indeterminate,
            size_matches: None,
            details,
        }
    }
}

/// Outcome of a conditional "write-if-absent" call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The object was written by this call.
    Written,
    /// A concurrent writer won the precondition race. The object exists;
    /// post-write verification is the arbiter of its content.
    RaceDetected,
}

/// Input to an upload call.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Complete object content.
    pub bytes: Bytes,
    /// Original filename; only its extension flows into the derived key.
    pub filename: String,
    /// MIME type stored with the object.
    pub content_type: String,
    /// Logical path prefix for the derived key.
    pub path_prefix: String,
    /// Optional Cache-Control value stored with the object.
    pub cache_control: Option<String>,
}
