//! Explicit per-provider configuration.
//!
//! Configuration is constructed once at startup and passed by value into
//! each store; core logic performs no ambient or global lookup.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Configuration for the R2 store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct R2Config {
    /// Bucket objects are written to.
    pub bucket: String,
    /// Base URL the bucket is served from (custom domain or the r2.dev
    /// host), with or without a trailing slash.
    pub public_base_url: String,
}

impl R2Config {
    /// Public URL for a stored key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

/// Configuration for the Firebase Storage store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    /// Backing GCS bucket (usually `<project>.appspot.com`).
    pub bucket: String,
}

impl FirebaseConfig {
    /// Public URL for an object made publicly readable.
    pub fn public_url(&self, object_path: &str) -> String {
        format!("https://storage.googleapis.com/{}/{}", self.bucket, object_path)
    }

    /// Firebase-style direct download URL.
    pub fn download_url(&self, object_path: &str) -> String {
        format!(
            "https://firebasestorage.googleapis.com/v0/b/{}/o/{}?alt=media",
            self.bucket,
            utf8_percent_encode(object_path, NON_ALPHANUMERIC)
        )
    }
}

/// Configuration for the Drive store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Folder(s) the uploaded file is created under.
    pub parent_folder_ids: Vec<String>,
    /// Pass `supportsAllDrives` on every call (shared-drive folders).
    #[serde(default)]
    pub supports_all_drives: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_r2_public_url_normalizes_trailing_slash() {
        let with_slash = R2Config {
            bucket: "assets".to_string(),
            public_base_url: "https://cdn.example.com/".to_string(),
        };
        let without_slash = R2Config {
            bucket: "assets".to_string(),
            public_base_url: "https://cdn.example.com".to_string(),
        };
        assert_eq!(
            with_slash.public_url("media/abc.png"),
            "https://cdn.example.com/media/abc.png"
        );
        assert_eq!(
            with_slash.public_url("media/abc.png"),
            without_slash.public_url("media/abc.png")
        );
    }

    #[test]
    fn test_firebase_urls() {
        let config = FirebaseConfig {
            bucket: "proj.appspot.com".to_string(),
        };
        assert_eq!(
            config.public_url("media/abc.png"),
            "https://storage.googleapis.com/proj.appspot.com/media/abc.png"
        );
        // The object path is percent-encoded in the download form.
        assert_eq!(
            config.download_url("media/abc.png"),
            "https://firebasestorage.googleapis.com/v0/b/proj.appspot.com/o/media%2Fabc%2Epng?alt=media"
        );
    }
}
