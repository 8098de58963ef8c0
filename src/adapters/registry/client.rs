//! Registry client
//!
//! Wraps a [`Transport`] with the rate-limit [`BackoffPolicy`] and a
//! [`CancelToken`]. Every orchestration component talks to the registry
//! through this type, so every call is retried on 429 and interrupted on
//! shutdown the same way.

use super::http::HttpTransport;
use super::transport::{Query, Transport};
use crate::config::RegistryConfig;
use crate::core::backoff::BackoffPolicy;
use crate::core::cancel::CancelToken;
use crate::domain::{RemoteResource, Result};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Build an owned query from string pairs
pub fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Rate-limit aware, cancellable registry client
#[derive(Clone)]
pub struct RegistryClient {
    transport: Arc<dyn Transport>,
    backoff: BackoffPolicy,
    cancel: CancelToken,
}

impl RegistryClient {
    /// Create a client over an existing transport
    pub fn new(transport: Arc<dyn Transport>, backoff: BackoffPolicy, cancel: CancelToken) -> Self {
        Self {
            transport,
            backoff,
            cancel,
        }
    }

    /// Create an HTTP-backed client from the `[registry]` section
    ///
    /// # Example
    ///
    /// ```no_run
    /// use registrar::adapters::registry::RegistryClient;
    /// use registrar::config::load_config;
    /// use registrar::core::cancel::CancelToken;
    ///
    /// # fn example() -> registrar::domain::Result<()> {
    /// let config = load_config("registrar.toml")?;
    /// let client = RegistryClient::from_config(&config.registry, CancelToken::none())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config(config: &RegistryConfig, cancel: CancelToken) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(
            Arc::new(transport),
            BackoffPolicy::from_config(&config.retry),
            cancel,
        ))
    }

    /// Same transport and policy, different cancellation
    pub fn with_cancel(&self, cancel: CancelToken) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            backoff: self.backoff.clone(),
            cancel,
        }
    }

    /// A copy that ignores shutdown and deadlines
    ///
    /// Used for cleanup calls that must still reach the server after the
    /// operation they clean up after was cancelled.
    pub fn detached(&self) -> Self {
        self.with_cancel(CancelToken::none())
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// GET `path` with `query`, retried on 429
    pub async fn get(&self, path: &str, query: &Query) -> Result<Value> {
        let label = format!("GET {path}");
        self.backoff
            .run(&self.cancel, &label, || self.transport.get(path, query))
            .await
    }

    /// POST a JSON body to `path`, retried on 429
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let label = format!("POST {path}");
        self.backoff
            .run(&self.cancel, &label, || self.transport.post(path, body))
            .await
    }

    /// POST a serializable body
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.post(path, &body).await
    }

    /// GET a single resource
    pub async fn get_resource(&self, path: &str) -> Result<RemoteResource> {
        RemoteResource::from_value(self.get(path, &[]).await?)
    }

    /// POST and read the response as a single resource
    pub async fn post_resource<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<RemoteResource> {
        RemoteResource::from_value(self.post_json(path, body).await?)
    }
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("base_url", &self.transport.base_url())
            .field("backoff", &self.backoff)
            .finish()
    }
}
