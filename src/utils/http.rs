//! Subscription feed retrieval.

use std::future::Future;
use std::time::Duration;

use log::debug;
use reqwest::Client;

use crate::error::TransportError;

/// Default timeout for feed requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 20;

/// User agent most subscription providers answer with a share-link body
pub const DEFAULT_USER_AGENT: &str = "v2rayN/6.0";

/// Source of subscription feed bodies.
///
/// The sync workflow only needs "URL in, text out"; tests substitute an
/// in-memory implementation.
pub trait FeedFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// [`FeedFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(HttpFeedFetcher { client })
    }
}

impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        debug!("Fetching subscription feed: {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else {
                TransportError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else {
                TransportError::Body(e.to_string())
            }
        })
    }
}
