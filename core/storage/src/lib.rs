//! Content-addressed object storage with cross-provider integrity
//! verification.
//!
//! Upload a blob once, get back a verifiable reference: storage keys
//! derive from content digests (natural deduplication), writes are
//! race-tolerant write-if-absent sequences, and every successful upload
//! is re-confirmed through metadata-only backend calls before the result
//! is returned to the caller.
//!
//! # Design Principles
//! - Provider isolation: backend specifics stay behind per-backend
//!   boundary traits; callers own and supply the client handles
//! - Closed dispatch: locators are a tagged enum, matched exhaustively
//! - Metadata-only verification: object bytes are never re-downloaded
//! - No hidden retries: one logical write attempt per call, with a
//!   single precondition-race reconciliation

pub mod auth;
pub mod clients;
pub mod config;
pub mod delete;
pub mod firebase;
pub mod gdrive;
mod http;
pub mod integrity;
pub mod keys;
pub mod memory;
pub mod r2;
pub mod types;
pub mod verify;

pub use clients::BackendClients;
pub use delete::delete_by_locator;
pub use firebase::{FirebaseStore, GcsApi, HttpGcsClient};
pub use gdrive::{DriveApi, DriveStore, HttpDriveClient};
pub use integrity::{DigestAlgorithm, DigestTag, CONTENT_DIGEST_METADATA_KEY};
pub use keys::{derive_object_key, DerivedKey};
pub use r2::{BucketApi, R2Store, S3BucketClient};
pub use types::{
    IntegrityStatus, StorageLocator, StorageResult, UploadRequest, VerifyOutcome, WriteOutcome,
};
pub use verify::{verify, StorageRef};

pub use caslink_common::{Error, Provider, Result};
