//! reqwest-backed fetcher

use super::traits::{FetchFailure, Fetcher};
use crate::config::FetchConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

/// Fetcher that performs a plain HTTP GET with reqwest
///
/// The underlying client is shared by every download worker, so connections
/// are pooled across tasks.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher from the fetch configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed (e.g. the
    /// TLS backend fails to initialize).
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone());

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchFailure> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                format!("timeout fetching {}", url)
            } else if e.is_connect() {
                format!("connection failed for {}: {}", url, e)
            } else {
                format!("failed to fetch {}: {}", url, e)
            };
            FetchFailure::Transport(message)
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(url, status = status.as_u16(), "fetch returned non-200 status");
            return Err(FetchFailure::InvalidResource {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            FetchFailure::Transport(format!("failed to read response body from {}: {}", url, e))
        })?;

        debug!(url, bytes = body.len(), "fetch complete");
        Ok(body.to_vec())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
