//! News ingestion for the market dashboard
//!
//! This crate turns configured RSS feeds into canonical articles:
//! - Feed registry: the curated list of market feeds
//! - Proxy client: fetches each feed through a feed-to-JSON conversion service
//! - Normalizer: converts one raw proxy item into an `Article`
//! - Classifier: keyword-based sentiment and breaking-news signals

pub mod classifier;
pub mod error;
pub mod feeds;
pub mod normalizer;
pub mod proxy_client;
pub mod types;

pub use classifier::{classify, detect_breaking, detect_sentiment, Signals};
pub use error::NewsError;
pub use feeds::{get_market_feeds, sources_by_priority};
pub use normalizer::{normalize_item, placeholder_image, SUMMARY_MAX_CHARS};
pub use proxy_client::{FeedFetcher, FeedProxyClient, FeedProxyConfig};
pub use types::{ProxyResponse, RawEnclosure, RawFeedItem};
