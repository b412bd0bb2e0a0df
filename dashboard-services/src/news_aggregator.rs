//! News Aggregator Service
//!
//! Background service that re-runs the aggregation cycle on a fixed
//! interval and keeps the latest merged article list for readers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use dashboard_core::{Article, ArticleQuery};

use crate::news_service::NewsService;

/// Configuration for NewsAggregator
#[derive(Debug, Clone)]
pub struct NewsAggregatorConfig {
    /// How often to re-run the aggregation cycle (in seconds)
    pub refresh_interval_secs: u64,
    /// Delay before the first cycle (in seconds)
    pub initial_delay_secs: u64,
}

impl Default for NewsAggregatorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 300,
            initial_delay_secs: 1,
        }
    }
}

/// Background refresher holding the latest article snapshot
pub struct NewsAggregator {
    news_service: Arc<NewsService>,
    config: NewsAggregatorConfig,
    latest: RwLock<Vec<Article>>,
    last_refreshed: RwLock<Option<DateTime<Utc>>>,
}

impl NewsAggregator {
    /// Create a new NewsAggregator
    pub fn new(news_service: Arc<NewsService>, config: NewsAggregatorConfig) -> Self {
        info!("Initializing NewsAggregator");
        Self {
            news_service,
            config,
            latest: RwLock::new(Vec::new()),
            last_refreshed: RwLock::new(None),
        }
    }

    /// Start the background refresh loop
    ///
    /// The snapshot is seeded from the archive right away so readers get
    /// the previous session's articles before the first cycle completes.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            "Starting NewsAggregator with refresh interval {}s",
            self.config.refresh_interval_secs
        );

        tokio::spawn(async move {
            let archived = self.news_service.archived_articles().await;
            if !archived.is_empty() {
                debug!("Seeded snapshot with {} archived articles", archived.len());
                *self.latest.write().await = archived;
            }

            tokio::time::sleep(Duration::from_secs(self.config.initial_delay_secs)).await;

            let mut ticker = interval(Duration::from_secs(self.config.refresh_interval_secs.max(1)));
            loop {
                ticker.tick().await;
                self.refresh_now().await;
            }
        })
    }

    /// Run one cycle immediately and publish its result
    ///
    /// Returns the number of articles in the new snapshot.
    pub async fn refresh_now(&self) -> usize {
        let articles = self.news_service.fetch_market_news().await;
        let count = articles.len();

        *self.latest.write().await = articles;
        *self.last_refreshed.write().await = Some(Utc::now());

        debug!("News snapshot updated: {} articles", count);
        count
    }

    /// Articles from the latest snapshot that match `query`
    pub async fn latest(&self, query: &ArticleQuery) -> Vec<Article> {
        query.apply(&self.latest.read().await)
    }

    /// When the snapshot was last replaced by a cycle
    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        *self.last_refreshed.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::LocalArchive;
    use crate::kv_store::MemoryKvStore;
    use crate::news_service::NewsServiceConfig;
    use async_trait::async_trait;
    use dashboard_core::{FeedSource, NewsCategory, Sentiment};
    use dashboard_news::{FeedFetcher, NewsError, RawFeedItem};

    struct HeadlineFetcher(Vec<&'static str>);

    #[async_trait]
    impl FeedFetcher for HeadlineFetcher {
        async fn fetch_feed(&self, _source: &FeedSource) -> Result<Vec<RawFeedItem>, NewsError> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, title)| RawFeedItem {
                    title: Some(title.to_string()),
                    pub_date: Some((Utc::now() - chrono::Duration::minutes(i as i64)).to_rfc3339()),
                    link: Some(format!("https://x.com/{}", i)),
                    ..Default::default()
                })
                .collect())
        }
    }

    fn aggregator(headlines: Vec<&'static str>) -> NewsAggregator {
        let service = NewsService::new(
            Arc::new(HeadlineFetcher(headlines)),
            Arc::new(LocalArchive::new(Arc::new(MemoryKvStore::new()))),
            vec![FeedSource::new("https://cointelegraph.com/rss", NewsCategory::Crypto, "Cointelegraph", 4)],
            NewsServiceConfig::default(),
        );
        NewsAggregator::new(Arc::new(service), NewsAggregatorConfig::default())
    }

    #[tokio::test]
    async fn test_refresh_now_publishes_snapshot() {
        let aggregator = aggregator(vec!["Bitcoin surges past record", "Ether slumps", "Quiet session"]);
        assert!(aggregator.last_refreshed().await.is_none());
        assert!(aggregator.latest(&ArticleQuery::default()).await.is_empty());

        assert_eq!(aggregator.refresh_now().await, 3);
        assert!(aggregator.last_refreshed().await.is_some());

        let bearish = aggregator
            .latest(&ArticleQuery {
                sentiment: Some(Sentiment::Bearish),
                ..ArticleQuery::default()
            })
            .await;
        assert_eq!(bearish.len(), 1);
        assert_eq!(bearish[0].headline, "Ether slumps");

        let limited = aggregator
            .latest(&ArticleQuery {
                limit: 2,
                ..ArticleQuery::default()
            })
            .await;
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].headline, "Bitcoin surges past record");
    }

    #[tokio::test]
    async fn test_background_loop_publishes_first_cycle() {
        let aggregator = Arc::new(NewsAggregator::new(
            aggregator(vec!["Gold edges higher"]).news_service,
            NewsAggregatorConfig {
                refresh_interval_secs: 60,
                initial_delay_secs: 0,
            },
        ));
        let handle = Arc::clone(&aggregator).start();

        let published = tokio::time::timeout(Duration::from_secs(5), async {
            while aggregator.last_refreshed().await.is_none() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        handle.abort();

        assert!(published.is_ok());
        let latest = aggregator.latest(&ArticleQuery::default()).await;
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].headline, "Gold edges higher");
    }
}
