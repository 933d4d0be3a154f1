//! Upstream robots.txt fetcher.
//!
//! One job: GET `<origin>/robots.txt` and hand back the raw bytes. The
//! pipeline does not care why a fetch failed: a 404, a 503, and a timeout
//! are all the same `UpstreamUnavailable` to it.

use async_trait::async_trait;
use bytes::Bytes;
use scrapegate_core::Error;
use std::time::Duration;

/// Capability seam over the outbound robots.txt request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `origin + "/robots.txt"`, returning the raw body bytes.
    async fn fetch(&self, origin: &str) -> Result<Bytes, Error>;
}

/// reqwest-backed fetcher.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// Build the fetcher with the given user agent and per-request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::UpstreamUnavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, origin: &str) -> Result<Bytes, Error> {
        let url = format!("{origin}/robots.txt");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            // drain the body so the connection goes back to the pool
            let _ = response.bytes().await;
            tracing::warn!(url = %url, status = status.as_u16(), "robots.txt fetch returned non-success status");
            return Err(Error::UpstreamUnavailable(format!("status {} from {url}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("failed to read body from {url}: {e}")))?;

        tracing::debug!(url = %url, bytes = bytes.len(), "fetched robots.txt");
        Ok(bytes)
    }
}
