//! Token endpoint client
//!
//! The outbound POST sits behind [`TokenClient`] so the exchange engine can be
//! driven by a scripted provider in tests.

use crate::oauth::models::GrantRequest;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Token endpoint of the identity provider
pub const TOKEN_ENDPOINT: &str = "https://app.vssps.visualstudio.com/oauth2/token";

/// Transport-level failure of the outbound call
#[derive(Debug, Error)]
pub enum TransportError {
    /// reqwest failure (connection, DNS, timeout, body read)
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Any other transport failure
    #[error("{0}")]
    Other(String),
}

/// Sends grant requests to the token endpoint
#[async_trait]
pub trait TokenClient: Send + Sync {
    /// POST the form-encoded grant and return the response body as text.
    ///
    /// Any HTTP status counts as a completed exchange; only transport failures
    /// (connection, DNS, timeout) are errors.
    async fn post_form(&self, grant: &GrantRequest) -> Result<String, TransportError>;
}

/// reqwest-backed [`TokenClient`]
#[derive(Debug, Clone)]
pub struct HttpTokenClient {
    client: Client,
    endpoint: Url,
}

impl HttpTokenClient {
    /// Client for the fixed provider token endpoint, without a timeout
    pub fn new() -> Result<Self, TransportError> {
        let endpoint = Url::parse(TOKEN_ENDPOINT)
            .map_err(|e| TransportError::Other(format!("Invalid token endpoint: {e}")))?;
        Ok(Self {
            client: Client::builder().build()?,
            endpoint,
        })
    }

    /// Point the client at another token endpoint
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Rebuild the underlying client with a request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, TransportError> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Token endpoint requests are posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TokenClient for HttpTokenClient {
    async fn post_form(&self, grant: &GrantRequest) -> Result<String, TransportError> {
        debug!(
            endpoint = %self.endpoint,
            grant_type = grant.grant_type(),
            "Posting grant request to token endpoint"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(grant)
            .send()
            .await?;

        debug!(status = %response.status(), "Token endpoint responded");

        Ok(response.text().await?)
    }
}
