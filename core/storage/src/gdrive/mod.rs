//! Google Drive backend.
//!
//! Drive has no content-addressed lookup and no digest comparable to the
//! content tag (only a legacy checksum), so uploads always create a new
//! file and verification is limited to existence and size.

pub mod client;
pub mod store;

pub use client::{DriveApi, DriveFile, DriveLinks, HttpDriveClient};
pub use store::DriveStore;
