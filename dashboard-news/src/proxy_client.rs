//! Feed-to-JSON proxy client
//!
//! RSS feeds are not fetched directly; each one is requested through a
//! conversion service that answers with `{ status, items }` JSON.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use dashboard_core::FeedSource;

use crate::error::NewsError;
use crate::types::{ProxyResponse, RawFeedItem};

/// Default public endpoint of the conversion service
pub const DEFAULT_PROXY_URL: &str = "https://api.rss2json.com/v1/api.json";

/// Fetches the raw items of one feed
///
/// The orchestrator only depends on this trait, so tests can swap in a stub.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch_feed(&self, source: &FeedSource) -> Result<Vec<RawFeedItem>, NewsError>;
}

/// Configuration for [`FeedProxyClient`]
#[derive(Debug, Clone)]
pub struct FeedProxyConfig {
    /// Conversion endpoint; the feed URL is passed as `rss_url`
    pub base_url: String,
    /// Optional key, sent as `api_key`
    pub api_key: Option<String>,
    pub user_agent: String,
    /// HTTP client timeout (the orchestrator applies its own per-source timeout as well)
    pub request_timeout: Duration,
}

impl Default for FeedProxyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROXY_URL.to_string(),
            api_key: None,
            user_agent: "MarketDashboard/1.0".to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// HTTP client for the conversion service
#[derive(Clone)]
pub struct FeedProxyClient {
    client: Client,
    config: FeedProxyConfig,
}

impl FeedProxyClient {
    /// Create a client against the default public proxy
    pub fn new() -> Self {
        Self::with_config(FeedProxyConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(config: FeedProxyConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.request_timeout)
                .user_agent(config.user_agent.clone())
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
        }
    }

    /// Proxy URL for a feed
    pub fn request_url(&self, feed_url: &str) -> Result<url::Url, NewsError> {
        let mut params = vec![("rss_url", feed_url)];
        if let Some(key) = self.config.api_key.as_deref() {
            params.push(("api_key", key));
        }
        url::Url::parse_with_params(&self.config.base_url, &params).map_err(|e| {
            NewsError::InvalidConfig(format!("Bad proxy URL {}: {}", self.config.base_url, e))
        })
    }
}

impl Default for FeedProxyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedFetcher for FeedProxyClient {
    #[instrument(skip(self, source), fields(source = %source.source, feed = %source.url))]
    async fn fetch_feed(&self, source: &FeedSource) -> Result<Vec<RawFeedItem>, NewsError> {
        let url = self.request_url(&source.url)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                NewsError::Timeout(self.config.request_timeout.as_millis() as u64)
            } else {
                NewsError::RequestFailed(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(NewsError::HttpStatus {
                status: response.status().as_u16(),
                message: format!("Failed to fetch {}", source.url),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| NewsError::RequestFailed(e.to_string()))?;

        parse_proxy_payload(&body)
    }
}

/// Decode a proxy body into raw items
///
/// A non-"ok" status or an undecodable body fails the whole feed; an item
/// that is not an object is dropped on its own.
pub fn parse_proxy_payload(body: &[u8]) -> Result<Vec<RawFeedItem>, NewsError> {
    let payload: ProxyResponse = serde_json::from_slice(body)
        .map_err(|e| NewsError::ParseError(format!("Invalid proxy payload: {}", e)))?;

    if !payload.is_ok() {
        return Err(NewsError::ProxyStatus {
            status: payload.status.unwrap_or_else(|| "missing".to_string()),
            message: payload.message.unwrap_or_default(),
        });
    }

    let items = payload
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match RawFeedItem::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("Dropping malformed feed item: {}", e);
                None
            }
        })
        .collect();

    Ok(items)
}
