//! News Service
//!
//! Aggregation orchestrator for the market news feed. Each cycle fans out
//! one fetch per configured feed, normalizes and classifies the items,
//! merges them into the archive and hands back the merged list.
//!
//! Failures are contained at the narrowest level possible:
//! - a bad item is dropped, its siblings survive
//! - a failed, slow or malformed feed contributes nothing, other feeds survive
//! - a failed archive write degrades persistence, never the returned list
//! - anything escaping the above falls back to the last archived articles

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use dashboard_core::{Article, FeedSource};
use dashboard_news::{classify, normalize_item, FeedFetcher, NewsError, RawFeedItem};

use crate::archive::{ArchiveStore, SaveOutcome};
use crate::error::NewsServiceError;

/// Configuration for NewsService
#[derive(Debug, Clone)]
pub struct NewsServiceConfig {
    /// Per-feed deadline; a feed that misses it counts as failed
    pub fetch_timeout: Duration,
    /// Maximum feeds fetched at the same time
    pub max_concurrent_fetches: usize,
}

impl Default for NewsServiceConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            max_concurrent_fetches: 8,
        }
    }
}

/// Outcome of one aggregation cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Merged, retention-pruned articles, newest first
    pub articles: Vec<Article>,
    /// Articles produced by this cycle's fetches
    pub fresh_count: usize,
    pub succeeded_sources: Vec<String>,
    pub failed_sources: Vec<String>,
    pub save: SaveOutcome,
}

/// Articles gathered from the live feeds before merging
struct FreshBatch {
    articles: Vec<Article>,
    succeeded: Vec<String>,
    failed: Vec<String>,
}

/// Aggregation orchestrator
pub struct NewsService {
    fetcher: Arc<dyn FeedFetcher>,
    archive: Arc<dyn ArchiveStore>,
    sources: Vec<FeedSource>,
    config: NewsServiceConfig,
    /// Serializes whole cycles so overlapping refreshes cannot lose updates
    cycle_lock: Mutex<()>,
    last_save: RwLock<Option<SaveOutcome>>,
}

impl NewsService {
    /// Create a new NewsService
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        archive: Arc<dyn ArchiveStore>,
        sources: Vec<FeedSource>,
        config: NewsServiceConfig,
    ) -> Self {
        info!(
            "Initializing NewsService with {} feeds (timeout {:?}, concurrency {})",
            sources.len(),
            config.fetch_timeout,
            config.max_concurrent_fetches
        );
        Self {
            fetcher,
            archive,
            sources,
            config,
            cycle_lock: Mutex::new(()),
            last_save: RwLock::new(None),
        }
    }

    /// Fetch, merge and return the market news feed
    ///
    /// Never fails: on a total pipeline failure the last archived articles
    /// are returned instead (empty if the archive is unreadable).
    pub async fn fetch_market_news(&self) -> Vec<Article> {
        match self.refresh().await {
            Ok(report) => report.articles,
            Err(e) => {
                error!("News aggregation failed, serving archive: {}", e);
                self.archived_articles().await
            }
        }
    }

    /// Run one aggregation cycle and report what happened
    pub async fn refresh(&self) -> Result<CycleReport, NewsServiceError> {
        match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(report) => Ok(report),
            Err(panic) => Err(NewsServiceError::CycleAborted(panic_message(panic.as_ref()))),
        }
    }

    /// Archived articles, pruned and sorted like a cycle result
    pub async fn archived_articles(&self) -> Vec<Article> {
        let archived = self.archive.load().await;
        self.archive.merge(archived, Vec::new(), Utc::now())
    }

    /// Outcome of the most recent archive write
    pub async fn last_save_outcome(&self) -> Option<SaveOutcome> {
        self.last_save.read().await.clone()
    }

    #[instrument(skip(self))]
    async fn run_cycle(&self) -> CycleReport {
        // Held for the whole cycle: a cycle that fetched earlier must not
        // save after one that fetched later.
        let _cycle = self.cycle_lock.lock().await;

        let batch = self.fetch_fresh(Local::now()).await;
        let fresh_count = batch.articles.len();

        let (articles, save) = {
            let archived = self.archive.load().await;
            let archived_count = archived.len();
            let merged = self.archive.merge(archived, batch.articles, Utc::now());
            debug!(
                "Merged {} fresh with {} archived into {} articles",
                fresh_count,
                archived_count,
                merged.len()
            );

            let save = self.archive.save(&merged).await;
            if !save.is_persisted() {
                warn!("Archive not persisted this cycle: {:?}", save);
            }
            *self.last_save.write().await = Some(save.clone());
            (merged, save)
        };

        info!(
            "News cycle complete: {} articles ({} fresh, {}/{} feeds ok)",
            articles.len(),
            fresh_count,
            batch.succeeded.len(),
            self.sources.len()
        );

        CycleReport {
            articles,
            fresh_count,
            succeeded_sources: batch.succeeded,
            failed_sources: batch.failed,
            save,
        }
    }

    /// Fetch every feed concurrently, tolerating individual failures
    async fn fetch_fresh(&self, now: DateTime<Local>) -> FreshBatch {
        let timeout = self.config.fetch_timeout;

        // Futures are built up front so the stream holds concrete boxed
        // futures rather than a closure borrowing each source.
        let fetches: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let fetch = self.fetcher.fetch_feed(source);
                async move {
                    let result =
                        match AssertUnwindSafe(tokio::time::timeout(timeout, fetch)).catch_unwind().await {
                            Ok(Ok(result)) => result,
                            Ok(Err(_)) => Err(NewsError::Timeout(timeout.as_millis() as u64)),
                            Err(panic) => Err(NewsError::RequestFailed(format!(
                                "fetch panicked: {}",
                                panic_message(panic.as_ref())
                            ))),
                        };
                    (source, result)
                }
            })
            .collect();

        let results: Vec<(&FeedSource, Result<Vec<RawFeedItem>, NewsError>)> = stream::iter(fetches)
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let mut batch = FreshBatch {
            articles: Vec::new(),
            succeeded: Vec::new(),
            failed: Vec::new(),
        };

        for (source, result) in results {
            match result {
                Ok(items) => {
                    let articles = articles_from_items(&items, source, &now);
                    debug!(
                        "Fetched {} items ({} usable) from {}",
                        items.len(),
                        articles.len(),
                        source.source
                    );
                    batch.articles.extend(articles);
                    batch.succeeded.push(source.source.clone());
                }
                Err(e) => {
                    warn!("Failed to fetch feed {} ({}): {}", source.source, source.url, e);
                    batch.failed.push(source.source.clone());
                }
            }
        }

        batch
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Normalize and classify a feed's items, dropping the ones that fail
fn articles_from_items(
    items: &[RawFeedItem],
    source: &FeedSource,
    now: &DateTime<Local>,
) -> Vec<Article> {
    items
        .iter()
        .filter_map(|item| match normalize_item(item, source, now) {
            Ok(mut article) => {
                classify(&article.headline, &article.summary).apply(&mut article);
                Some(article)
            }
            Err(e) => {
                debug!("Dropping item from {}: {}", source.source, e);
                None
            }
        })
        .collect()
}
