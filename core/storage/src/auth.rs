//! Access-token boundary for the Google-backed clients.

use async_trait::async_trait;

use caslink_common::Result;

/// Source of OAuth2 bearer tokens.
///
/// Token acquisition and refresh live with the caller; the storage core
/// only ever asks for a currently valid token.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A currently valid access token.
    async fn access_token(&self) -> Result<String>;
}

/// Fixed-token provider for tests and short-lived credentials.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create a provider that always hands out `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}
