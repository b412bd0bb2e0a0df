//! Runtime configuration
//!
//! Everything has a working default; environment variables override.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use dashboard_core::{DashboardError, DashboardResult};
use dashboard_news::FeedProxyConfig;

use crate::archive::{ArchiveConfig, LocalArchive};
use crate::kv_store::SqliteKvStore;
use crate::news_aggregator::NewsAggregatorConfig;
use crate::news_service::NewsServiceConfig;

const DEFAULT_ARCHIVE_DB_PATH: &str = "data/news_archive.db";

/// Full configuration of the dashboard host process
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// SQLite file backing the article archive
    pub archive_db_path: PathBuf,
    /// Byte quota of the archive store, unlimited when `None`
    pub archive_quota_bytes: Option<usize>,
    pub proxy: FeedProxyConfig,
    pub news: NewsServiceConfig,
    pub aggregator: NewsAggregatorConfig,
    pub archive: ArchiveConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            archive_db_path: PathBuf::from(DEFAULT_ARCHIVE_DB_PATH),
            archive_quota_bytes: None,
            proxy: FeedProxyConfig::default(),
            news: NewsServiceConfig::default(),
            aggregator: NewsAggregatorConfig::default(),
            archive: ArchiveConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> DashboardResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> DashboardResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(path) = var("ARCHIVE_DB_PATH") {
            config.archive_db_path = PathBuf::from(path);
        }
        if let Some(quota) = var("ARCHIVE_QUOTA_BYTES") {
            config.archive_quota_bytes = Some(parse_number("ARCHIVE_QUOTA_BYTES", &quota)?);
        }

        if let Some(url) = var("FEED_PROXY_URL") {
            config.proxy.base_url = url;
        }
        config.proxy.api_key = var("FEED_PROXY_API_KEY");

        if let Some(secs) = var("FEED_FETCH_TIMEOUT_SECS") {
            let secs: u64 = parse_number("FEED_FETCH_TIMEOUT_SECS", &secs)?;
            if secs == 0 {
                return Err(DashboardError::config("FEED_FETCH_TIMEOUT_SECS must be positive"));
            }
            config.news.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = var("FEED_MAX_CONCURRENCY") {
            let n: usize = parse_number("FEED_MAX_CONCURRENCY", &n)?;
            if n == 0 {
                return Err(DashboardError::config("FEED_MAX_CONCURRENCY must be positive"));
            }
            config.news.max_concurrent_fetches = n;
        }
        if let Some(secs) = var("NEWS_REFRESH_INTERVAL_SECS") {
            let secs: u64 = parse_number("NEWS_REFRESH_INTERVAL_SECS", &secs)?;
            if secs == 0 {
                return Err(DashboardError::config("NEWS_REFRESH_INTERVAL_SECS must be positive"));
            }
            config.aggregator.refresh_interval_secs = secs;
        }

        Ok(config)
    }

    /// Open the SQLite store and the archive on top of it
    pub fn open_archive(&self) -> DashboardResult<LocalArchive> {
        let store = SqliteKvStore::new(&self.archive_db_path, self.archive_quota_bytes).map_err(|e| {
            DashboardError::storage(format!(
                "Failed to open archive at {}: {}",
                self.archive_db_path.display(),
                e
            ))
        })?;
        Ok(LocalArchive::with_config(Arc::new(store), self.archive.clone()))
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> DashboardResult<T> {
    value
        .parse()
        .map_err(|_| DashboardError::config(format!("{} must be a number, got \"{}\"", key, value)))
}
