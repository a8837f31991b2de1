//! HTTP client utilities.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::catalogs::CatalogError;
use crate::utils::{with_retry, with_timeout, RetryPolicy};

/// Default per-request deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
    }

    /// Create a new HTTP client with a custom user agent
    pub fn with_user_agent(user_agent: &str) -> Result<Self, CatalogError> {
        Self::with_settings(user_agent, Duration::from_secs(5))
    }

    /// Create a new HTTP client with a custom user agent and connect timeout.
    ///
    /// No overall request timeout is set on the reqwest client; deadlines are
    /// applied per attempt by [`with_timeout`].
    pub fn with_settings(user_agent: &str, connect_timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| CatalogError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET `url` and decode a JSON body.
    ///
    /// Each attempt is bounded by `timeout` and raced against `cancel`;
    /// attempts are repeated according to `policy`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<T, CatalogError> {
        with_retry(policy, cancel, || {
            with_timeout(self.fetch_json::<T>(url), timeout, Some(cancel))
        })
        .await
    }

    /// One attempt: send, check the status, decode
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::from_status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
