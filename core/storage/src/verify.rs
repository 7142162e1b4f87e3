//! Cross-provider, metadata-only verification.
//!
//! Verification never re-downloads object bytes: confirming existence,
//! digest and size must stay cheap at arbitrary object sizes, so only
//! HEAD/metadata calls are issued.

use caslink_common::{Error, Provider, Result};

use crate::clients::BackendClients;
use crate::firebase::client::GcsApi;
use crate::gdrive::client::DriveApi;
use crate::integrity::CONTENT_DIGEST_METADATA_KEY;
use crate::r2::client::BucketApi;
use crate::types::{IntegrityStatus, StorageLocator, StorageResult, VerifyOutcome};

/// A verification or deletion subject: either a full upload result or a
/// bare locator the caller persisted.
#[derive(Debug, Clone)]
pub enum StorageRef {
    Result(StorageResult),
    Locator(StorageLocator),
}

impl StorageRef {
    /// The locator identifying the object.
    pub fn locator(&self) -> Result<&StorageLocator> {
        match self {
            StorageRef::Result(result) => result.locator.as_ref().ok_or_else(|| {
                Error::InvalidInput("storage result carries no locator".to_string())
            }),
            StorageRef::Locator(locator) => Ok(locator),
        }
    }

    /// Expected digest hex and size, when the input carries them.
    fn expected(&self) -> Expected {
        match self {
            StorageRef::Result(result) => Expected {
                digest_hex: result.digest_tag.as_ref().map(|tag| tag.to_hex()),
                size_bytes: result.size_bytes,
            },
            StorageRef::Locator(_) => Expected::default(),
        }
    }
}

impl From<StorageResult> for StorageRef {
    fn from(result: StorageResult) -> Self {
        StorageRef::Result(result)
    }
}

impl From<StorageLocator> for StorageRef {
    fn from(locator: StorageLocator) -> Self {
        StorageRef::Locator(locator)
    }
}

/// Values verification compares backend metadata against.
#[derive(Debug, Clone, Default)]
struct Expected {
    digest_hex: Option<String>,
    size_bytes: Option<u64>,
}

/// Verify that the referenced object exists with the expected digest and
/// size, using metadata-only calls against the matching backend client.
///
/// A missing client and backend not-found conditions produce a
/// non-throwing outcome; any unrecognized backend failure propagates
/// unchanged.
pub async fn verify(subject: &StorageRef, clients: &BackendClients) -> Result<VerifyOutcome> {
    let locator = subject.locator()?;
    let expected = subject.expected();

    match locator {
        StorageLocator::R2 { bucket, key } => match &clients.r2 {
            Some(client) => verify_r2(client.as_ref(), bucket, key, &expected).await,
            None => Ok(VerifyOutcome::absent(Some(missing_client(Provider::R2)))),
        },
        StorageLocator::Firebase {
            bucket,
            object_path,
        } => match &clients.firebase {
            Some(client) => verify_firebase(client.as_ref(), bucket, object_path, &expected).await,
            None => Ok(VerifyOutcome::absent(Some(missing_client(
                Provider::Firebase,
            )))),
        },
        StorageLocator::Drive {
            file_id,
            supports_all_drives,
        } => match &clients.drive {
            Some(client) => {
                verify_drive(client.as_ref(), file_id, *supports_all_drives, &expected).await
            }
            None => Ok(VerifyOutcome::absent(Some(missing_client(Provider::Drive)))),
        },
    }
}

fn missing_client(provider: Provider) -> String {
    format!("missing {} client", provider)
}

/// HEAD the object and compare the stored digest metadata field.
///
/// With an expected digest the comparison is boolean: an absent stored
/// field counts as a mismatch. Without one the result stays
/// indeterminate regardless of what the backend stored.
async fn verify_r2(
    client: &dyn BucketApi,
    bucket: &str,
    key: &str,
    expected: &Expected,
) -> Result<VerifyOutcome> {
    let head = match client.head_object(bucket, key).await {
        Ok(head) => head,
        Err(err) if matches!(err.status(), Some(403 | 404)) => {
            return Ok(VerifyOutcome::absent(None))
        }
        Err(err) => return Err(err),
    };

    let stored = head.metadata.get(CONTENT_DIGEST_METADATA_KEY);
    let (integrity, details) = match (&expected.digest_hex, stored) {
        (None, _) => (
            IntegrityStatus::Indeterminate,
            Some("no expected digest supplied".to_string()),
        ),
        (Some(expected_hex), Some(stored)) if stored.eq_ignore_ascii_case(expected_hex) => {
            (IntegrityStatus::Match, None)
        }
        (Some(_), Some(stored)) => (
            IntegrityStatus::Mismatch,
            Some(format!("stored digest {} does not match", stored)),
        ),
        (Some(_), None) => (
            IntegrityStatus::Mismatch,
            Some("no stored digest metadata".to_string()),
        ),
    };

    Ok(VerifyOutcome {
        exists: true,
        integrity,
        size_matches: expected.size_bytes.map(|size| head.size_bytes == size),
        details,
    })
}

/// Existence check, then a metadata fetch reading the custom digest
/// field. Either side missing leaves the result indeterminate, with a
/// detail naming which condition applied.
async fn verify_firebase(
    client: &dyn GcsApi,
    bucket: &str,
    object_path: &str,
    expected: &Expected,
) -> Result<VerifyOutcome> {
    if !client.object_exists(bucket, object_path).await? {
        return Ok(VerifyOutcome::absent(None));
    }
    let object = client.get_object(bucket, object_path).await?;

    let stored = object
        .metadata
        .as_ref()
        .and_then(|m| m.get(CONTENT_DIGEST_METADATA_KEY));
    let (integrity, details) = match (&expected.digest_hex, stored) {
        (None, _) => (
            IntegrityStatus::Indeterminate,
            Some("no expected digest supplied".to_string()),
        ),
        (Some(_), None) => (
            IntegrityStatus::Indeterminate,
            Some("no stored digest metadata".to_string()),
        ),
        (Some(expected_hex), Some(stored)) if stored.eq_ignore_ascii_case(expected_hex) => {
            (IntegrityStatus::Match, None)
        }
        (Some(_), Some(stored)) => (
            IntegrityStatus::Mismatch,
            Some(format!("stored digest {} does not match", stored)),
        ),
    };

    Ok(VerifyOutcome {
        exists: true,
        integrity,
        size_matches: expected
            .size_bytes
            .map(|size| object.size_bytes() == Some(size)),
        details,
    })
}

/// Fetch file metadata by ID. Drive exposes no digest comparable to the
/// content tag, so size is the only integrity signal available.
async fn verify_drive(
    client: &dyn DriveApi,
    file_id: &str,
    supports_all_drives: bool,
    expected: &Expected,
) -> Result<VerifyOutcome> {
    let file = match client.get_file(file_id, supports_all_drives).await {
        Ok(file) => file,
        Err(err) if matches!(err.status(), Some(403 | 404)) => {
            return Ok(VerifyOutcome::absent(None))
        }
        Err(err) => return Err(err),
    };
    if file.trashed {
        return Ok(VerifyOutcome::absent(Some("file is trashed".to_string())));
    }

    Ok(VerifyOutcome {
        exists: true,
        integrity: IntegrityStatus::Indeterminate,
        size_matches: expected
            .size_bytes
            .map(|size| file.size_bytes() == Some(size)),
        details: Some("drive exposes no digest comparable to the content tag".to_string()),
    })
}

/// Enforce the post-upload contract: the object exists, its digest
/// matches when the backend has a comparable digest channel, and its
/// size matches. Each violated condition maps to a distinct fatal error.
pub(crate) fn enforce_post_upload(
    outcome: &VerifyOutcome,
    key: &str,
    expected_digest_hex: &str,
    expected_size: u64,
    digest_channel: bool,
) -> Result<()> {
    if !outcome.exists {
        return Err(Error::NotFoundAfterUpload(key.to_string()));
    }
    if digest_channel && !outcome.integrity.is_match() {
        return Err(Error::DigestMismatch {
            key: key.to_string(),
            expected: expected_digest_hex.to_string(),
        });
    }
    if outcome.size_matches == Some(false) {
        return Err(Error::SizeMismatch {
            key: key.to_string(),
            expected: expected_size,
        });
    }
    Ok(())
}
