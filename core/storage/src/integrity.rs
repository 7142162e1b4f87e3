//! Content digest computation and the tagged text form.
//!
//! A digest tag is `<algorithm>-<base64>`: a portable integrity
//! fingerprint that can later be re-checked against backend-native
//! metadata fields without re-reading object bytes.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256, Sha384, Sha512};

use caslink_common::{Error, Result};

/// Name of the custom metadata field carrying the content digest hex on
/// backends that support custom metadata (R2, GCS).
pub const CONTENT_DIGEST_METADATA_KEY: &str = "content-sha256";

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Algorithm label used in the tagged text form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    /// Digest size in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            other => Err(Error::MalformedDigestTag(format!(
                "unknown algorithm: {}",
                other
            ))),
        }
    }
}

/// An algorithm-tagged content digest.
///
/// Immutable once constructed; produced by [`DigestTag::compute`] or by
/// parsing the validated `<algorithm>-<base64>` text form. The decoded
/// payload length always matches the algorithm's digest size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestTag {
    algorithm: DigestAlgorithm,
    digest: Vec<u8>,
}

impl DigestTag {
    /// Hash `content` with `algorithm`.
    ///
    /// The digest depends only on the bytes, never on the container type
    /// holding them: a slice, a fixed-size array and an owned buffer with
    /// the same content produce identical tags.
    pub fn compute(algorithm: DigestAlgorithm, content: impl AsRef<[u8]>) -> Self {
        let digest = match algorithm {
            DigestAlgorithm::Sha256 => Sha256::digest(content.as_ref()).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(content.as_ref()).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(content.as_ref()).to_vec(),
        };
        Self { algorithm, digest }
    }

    /// Algorithm this tag was computed with.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.digest
    }

    /// Hex encoding of the raw digest, for comparison against
    /// backend-native hex metadata fields.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.digest)
    }
}

impl fmt::Display for DigestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm, BASE64.encode(&self.digest))
    }
}

impl FromStr for DigestTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (algorithm, encoded) = s.split_once('-').ok_or_else(|| {
            Error::MalformedDigestTag(format!("expected <algorithm>-<base64>, got: {}", s))
        })?;
        let algorithm: DigestAlgorithm = algorithm.parse()?;
        let digest = BASE64
            .decode(encoded)
            .map_err(|e| Error::MalformedDigestTag(format!("invalid base64 payload: {}", e)))?;
        if digest.len() != algorithm.digest_len() {
            return Err(Error::MalformedDigestTag(format!(
                "{} digest must be {} bytes, got {}",
                algorithm,
                algorithm.digest_len(),
                digest.len()
            )));
        }
        Ok(Self { algorithm, digest })
    }
}

impl Serialize for DigestTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DigestTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
