//! Common error types for caslink.

use thiserror::Error;

use crate::types::Provider;

/// Top-level error type for caslink operations.
///
/// Display strings carry a stable keyword per failure class ("Missing
/// client", "Malformed digest tag", "not found", "mismatch", "size
/// mismatch") so calling code and tests can branch on failure kind
/// without parsing free text beyond that keyword.
#[derive(Debug, Error)]
pub enum Error {
    /// No client handle was supplied for the provider a locator points
    /// at. A configuration signal, never conflated with "not found".
    #[error("Missing client: no {0} client supplied")]
    MissingClient(Provider),

    /// A digest tag did not match the `<algorithm>-<base64>` shape or
    /// decoded to the wrong length for its algorithm.
    #[error("Malformed digest tag: {0}")]
    MalformedDigestTag(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport-level failure before any backend status was available.
    #[error("Network error: {0}")]
    Network(String),

    /// A backend responded with an error status. Adapters inspect the
    /// status to classify the recognized not-found (403/404) and race
    /// (412) sets; everything else propagates unchanged.
    #[error("Backend error: status {status}: {message}")]
    Backend { status: u16, message: String },

    /// Post-write verification could not find the object.
    #[error("Verification failed: object not found after upload: {0}")]
    NotFoundAfterUpload(String),

    /// Post-write verification observed a content digest that does not
    /// match the uploaded bytes.
    #[error("Verification failed: content digest mismatch for {key} (expected {expected})")]
    DigestMismatch { key: String, expected: String },

    /// Post-write verification observed a size that does not match the
    /// uploaded bytes.
    #[error("Verification failed: size mismatch for {key} (expected {expected} bytes)")]
    SizeMismatch { key: String, expected: u64 },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Backend HTTP status, when this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
