//! HTTP fetcher trait - Abstraction over the network
//!
//! Every remote read in the pipeline (manifest, release listings, asset
//! downloads) goes through [`Fetcher`], so tests can swap in an in-memory
//! implementation and count requests.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::Settings;
use crate::error::FetchError;

/// Trait for fetching remote documents
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body bytes
    ///
    /// Non-success responses are reported as [`FetchError::Status`].
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// reqwest-backed fetcher used outside of tests
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client from the user's settings
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        Self::with_timeout(
            &settings.user_agent,
            Duration::from_secs(settings.timeout_seconds.max(1)),
        )
    }

    pub fn with_timeout(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        // GitHub's API rejects requests without a User-Agent
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(bytes.to_vec())
    }
}
