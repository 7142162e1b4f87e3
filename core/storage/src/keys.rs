//! Deterministic, content-addressed storage key derivation.
//!
//! A key is a pure function of (content bytes, file extension, path
//! prefix). Identical content with the same extension always lands on
//! the same key, which is what makes writes naturally deduplicating.
//! Filenames beyond their extension, and upload time, never influence
//! the key.

use sha2::{Digest, Sha256};

/// Hex characters kept in the short key form (~80 bits of the digest,
/// enough to keep collision probability negligible at expected object
/// counts while keeping keys short).
const SHORT_HASH_LEN: usize = 20;

/// Extension applied when the filename carries none.
const DEFAULT_EXTENSION: &str = "bin";

/// Result of key derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKey {
    /// Storage key, `prefix/<hash>.<ext>`.
    pub key: String,
    /// Full 64-character sha-256 hex of the content.
    pub content_hash_hex: String,
}

/// Derive a storage key from content bytes and the original filename.
///
/// With `short_hash` the key uses the first [`SHORT_HASH_LEN`] hex
/// characters of the content hash; otherwise the full 64-character hex.
/// Runs of slashes in `path_prefix` collapse to one and edge slashes are
/// trimmed, so `/media//images/` and `media/images` derive the same key.
pub fn derive_object_key(
    path_prefix: &str,
    filename: &str,
    content: impl AsRef<[u8]>,
    short_hash: bool,
) -> DerivedKey {
    let content_hash_hex = hex::encode(Sha256::digest(content.as_ref()));
    let hash_part = if short_hash {
        &content_hash_hex[..SHORT_HASH_LEN]
    } else {
        content_hash_hex.as_str()
    };
    let file_name = format!("{}.{}", hash_part, file_extension(filename));

    let key = {
        let mut segments: Vec<&str> = path_prefix.split('/').filter(|s| !s.is_empty()).collect();
        segments.push(&file_name);
        segments.join("/")
    };

    DerivedKey {
        key,
        content_hash_hex,
    }
}

/// Extension of `filename`, defaulting when there is none.
///
/// A bare dot-file (".gitignore") counts as having no extension.
fn file_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
        _ => DEFAULT_EXTENSION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_shape_and_short_hash() {
        let derived = derive_object_key("media/images", "photo.png", b"hello-world", true);
        assert_eq!(derived.key, "media/images/afa27b44d43b02a9fea4.png");
        assert_eq!(
            derived.content_hash_hex,
            "afa27b44d43b02a9fea41d13cedc2e4016cfcf87c5dbf990e593669aa8ce286d"
        );
    }

    #[test]
    fn test_full_hash_form() {
        let derived = derive_object_key("media", "photo.png", b"hello-world", false);
        assert_eq!(
            derived.key,
            "media/afa27b44d43b02a9fea41d13cedc2e4016cfcf87c5dbf990e593669aa8ce286d.png"
        );
    }

    #[test]
    fn test_slash_runs_collapse() {
        let a = derive_object_key("/media//images/", "photo.png", b"x", true);
        let b = derive_object_key("media/images", "photo.png", b"x", true);
        assert_eq!(a, b);
        assert!(!a.key.starts_with('/'));
        assert!(!a.key.contains("//"));
    }

    #[test]
    fn test_filename_beyond_extension_is_ignored() {
        let a = derive_object_key("p", "vacation-2024.jpg", b"content", true);
        let b = derive_object_key("p", "x.jpg", b"content", true);
        assert_eq!(a.key, b.key);
    }

    #[test]
    fn test_missing_extension_defaults_to_bin() {
        let no_dot = derive_object_key("p", "archive", b"content", true);
        assert!(no_dot.key.ends_with(".bin"));

        let dot_file = derive_object_key("p", ".gitignore", b"content", true);
        assert!(dot_file.key.ends_with(".bin"));

        let trailing_dot = derive_object_key("p", "weird.", b"content", true);
        assert!(trailing_dot.key.ends_with(".bin"));
    }

    proptest! {
        #[test]
        fn prop_key_is_deterministic(
            content in proptest::collection::vec(any::<u8>(), 1..512),
            prefix in "[a-z]{1,8}(/[a-z]{1,8}){0,2}",
        ) {
            let a = derive_object_key(&prefix, "f.png", &content, true);
            let b = derive_object_key(&prefix, "f.png", &content, true);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_changed_content_changes_hash(
            content in proptest::collection::vec(any::<u8>(), 1..512),
        ) {
            let mut mutated = content.clone();
            mutated[0] ^= 0x01;
            let a = derive_object_key("p", "f.bin", &content, true);
            let b = derive_object_key("p", "f.bin", &mutated, true);
            prop_assert_ne!(a.content_hash_hex, b.content_hash_hex);
        }
    }
}
