//! services/api/src/adapters/jwks.rs
//!
//! Fetches the identity provider's JSON Web Key Set over HTTP.
//! Implements the `SigningKeySource` port; there is no caching, every call hits the endpoint.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use question_paper_core::ports::{PortError, PortResult, SigningKeySource};
use std::time::Duration;
use tracing::debug;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct HttpJwksSource {
    client: reqwest::Client,
    url: String,
}

impl HttpJwksSource {
    pub fn new(url: impl Into<String>) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SigningKeySource for HttpJwksSource {
    async fn signing_keys(&self) -> PortResult<JwkSet> {
        debug!(url = %self.url, "Fetching signing keys");

        let keys = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| PortError::Unexpected(format!("Failed to fetch signing keys: {e}")))?
            .json::<JwkSet>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Invalid signing key set: {e}")))?;

        Ok(keys)
    }
}
