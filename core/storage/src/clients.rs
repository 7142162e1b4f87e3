//! Caller-supplied backend client bundle.

use std::sync::Arc;

use crate::firebase::GcsApi;
use crate::gdrive::DriveApi;
use crate::r2::BucketApi;

/// The set of live backend clients available to [`crate::verify::verify`]
/// and [`crate::delete::delete_by_locator`], keyed by provider.
///
/// Handles are owned by the caller and shared by reference for the
/// duration of one call. A missing handle is a configuration signal,
/// reported distinctly from backend "not found" state.
#[derive(Clone, Default)]
pub struct BackendClients {
    pub r2: Option<Arc<dyn BucketApi>>,
    pub firebase: Option<Arc<dyn GcsApi>>,
    pub drive: Option<Arc<dyn DriveApi>>,
}

impl BackendClients {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an R2 client.
    pub fn with_r2(mut self, client: Arc<dyn BucketApi>) -> Self {
        self.r2 = Some(client);
        self
    }

    /// Attach a Firebase/GCS client.
    pub fn with_firebase(mut self, client: Arc<dyn GcsApi>) -> Self {
        self.firebase = Some(client);
        self
    }

    /// Attach a Drive client.
    pub fn with_drive(mut self, client: Arc<dyn DriveApi>) -> Self {
        self.drive = Some(client);
        self
    }
}
