//! reqwest-backed transport
//!
//! Sends JSON requests to the registry with the configured credential
//! attached to every call.

use super::transport::{classify_response, join_url, Query, Transport};
use crate::config::{AuthType, RegistryConfig, SecretString};
use crate::domain::{RegistrarError, RemoteError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::Duration;

/// HTTP transport for the registry API
///
/// # Example
///
/// ```no_run
/// use registrar::adapters::registry::HttpTransport;
/// use registrar::config::load_config;
///
/// # fn example() -> registrar::domain::Result<()> {
/// let config = load_config("registrar.toml")?;
/// let transport = HttpTransport::new(&config.registry)?;
/// # Ok(())
/// # }
/// ```
pub struct HttpTransport {
    /// Base URL of the API
    base_url: String,

    /// HTTP client for making requests
    client: Client,

    /// How the credential is presented
    auth_type: AuthType,

    /// API key
    api_key: SecretString,
}

impl HttpTransport {
    /// Create a new transport from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            tracing::warn!(
                base_url = %config.base_url,
                "TLS certificate verification is DISABLED for the registry; use only against development servers"
            );
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            RegistrarError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
            auth_type: config.auth_type,
            api_key: config.api_key.clone(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let key: &str = self.api_key.expose_secret().as_ref();
        match self.auth_type {
            AuthType::Basic => request.basic_auth(key, Some("")),
            AuthType::Bearer => request.bearer_auth(key),
        }
    }

    async fn send(&self, method: &'static str, path: &str, request: RequestBuilder) -> Result<Value> {
        let resp = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RegistrarError::Remote(RemoteError::ConnectionFailed(e.to_string())))?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                "failed to read response body: {e}"
            )))
        })?;

        tracing::debug!(method, path, status, "Registry request completed");

        classify_response(status, &body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &Query) -> Result<Value> {
        let url = join_url(&self.base_url, path);
        let request = self.client.get(&url).query(query);
        self.send("GET", path, request).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = join_url(&self.base_url, path);
        let request = self.client.post(&url).json(body);
        self.send("POST", path, request).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{secret_string, RetryConfig};

    #[test]
    fn test_http_transport_creation() {
        let config = RegistryConfig {
            base_url: "https://example.benchling.com/api/v2".to_string(),
            auth_type: AuthType::Basic,
            api_key: secret_string("sk_test".to_string()),
            timeout_seconds: 30,
            tls_verify: true,
            retry: RetryConfig::default(),
        };

        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "https://example.benchling.com/api/v2");
    }
}
