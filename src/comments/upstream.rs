//! Client for the real comment API.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use reqwest::header::CONTENT_TYPE;

use crate::comments::UpstreamError;
use crate::dns::{BypassResolver, HostLookup, ResolverCache};

/// Forwards the client's request body to the real endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    url: String,
}

impl UpstreamClient {
    /// Build a client whose connections resolve through `cache`.
    pub fn new<L: HostLookup>(
        url: impl Into<String>,
        cache: Arc<ResolverCache<L>>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        // A system proxy would resolve the host itself and bypass the cache.
        let client = reqwest::Client::builder()
            .no_proxy()
            .dns_resolver(Arc::new(BypassResolver::new(cache)))
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Client)?;
        Ok(Self::with_client(client, url))
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `body` verbatim and return the response body.
    pub async fn fetch(&self, body: Bytes) -> Result<Bytes, UpstreamError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }
        response.bytes().await.map_err(UpstreamError::from_reqwest)
    }
}
