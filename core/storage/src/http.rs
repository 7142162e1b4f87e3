//! Shared response handling for the reqwest-based clients.

use reqwest::Response;

use caslink_common::{Error, Result};

/// Parse a JSON body on success; otherwise fold the response into the
/// common taxonomy, preserving the backend status for classification.
pub(crate) async fn handle_json<T: serde::de::DeserializeOwned>(
    op: &str,
    response: Response,
) -> Result<T> {
    if response.status().is_success() {
        response
            .json()
            .await
            .map_err(|e| Error::Network(format!("{}: failed to parse response: {}", op, e)))
    } else {
        Err(backend_error(op, response).await)
    }
}

/// Discard the body on success; otherwise fold into the common taxonomy.
pub(crate) async fn handle_status(op: &str, response: Response) -> Result<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(backend_error(op, response).await)
    }
}

pub(crate) async fn backend_error(op: &str, response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::Backend {
        status,
        message: format!("{}: {}", op, body),
    }
}
