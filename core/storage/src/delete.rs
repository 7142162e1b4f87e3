//! Backend-dispatching, idempotent deletion.

use tracing::debug;

use caslink_common::{Error, Provider, Result};

use crate::clients::BackendClients;
use crate::types::StorageLocator;
use crate::verify::StorageRef;

/// Delete the referenced object.
///
/// "Already gone" conditions (403/404-class statuses) are success:
/// deletion is idempotent by design. A missing client for the locator's
/// provider is a configuration error, never a "nothing to delete"
/// condition. Any other backend failure propagates unchanged.
pub async fn delete_by_locator(subject: &StorageRef, clients: &BackendClients) -> Result<()> {
    let locator = subject.locator()?;

    let deleted = match locator {
        StorageLocator::R2 { bucket, key } => {
            let client = clients
                .r2
                .as_ref()
                .ok_or(Error::MissingClient(Provider::R2))?;
            client.delete_object(bucket, key).await
        }
        StorageLocator::Firebase {
            bucket,
            object_path,
        } => {
            let client = clients
                .firebase
                .as_ref()
                .ok_or(Error::MissingClient(Provider::Firebase))?;
            client.delete_object(bucket, object_path).await
        }
        StorageLocator::Drive {
            file_id,
            supports_all_drives,
        } => {
            let client = clients
                .drive
                .as_ref()
                .ok_or(Error::MissingClient(Provider::Drive))?;
            client.delete_file(file_id, *supports_all_drives).await
        }
    };

    match deleted {
        Ok(()) => Ok(()),
        Err(err) if matches!(err.status(), Some(403 | 404)) => {
            debug!(provider = %locator.provider(), "object already gone");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
