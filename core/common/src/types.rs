//! Common types used throughout caslink.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one of the supported storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Cloudflare R2 (S3-compatible API).
    R2,
    /// Firebase Storage (GCS-backed bucket).
    Firebase,
    /// Google Drive.
    Drive,
}

impl Provider {
    /// Stable lowercase label, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::R2 => "r2",
            Provider::Firebase => "firebase",
            Provider::Drive => "drive",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_labels() {
        assert_eq!(Provider::R2.as_str(), "r2");
        assert_eq!(Provider::Firebase.as_str(), "firebase");
        assert_eq!(Provider::Drive.as_str(), "drive");
        assert_eq!(Provider::Drive.to_string(), "drive");
    }

    #[test]
    fn test_provider_serialization() {
        let json = serde_json::to_string(&Provider::Firebase).unwrap();
        assert_eq!(json, "\"firebase\"");

        let provider: Provider = serde_json::from_str("\"r2\"").unwrap();
        assert_eq!(provider, Provider::R2);
    }
}
