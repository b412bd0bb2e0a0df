//! Archive Store
//!
//! Persisted collection of previously seen articles, stored as one JSON
//! list under a single versioned key. Every failure here is recovered
//! locally: an unreadable archive loads as empty, and a failed write
//! degrades persistence without touching the in-memory result.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use dashboard_core::Article;

use crate::error::ArchiveError;
use crate::kv_store::KeyValueStore;

/// Storage key; bump the version suffix when `Article` changes shape
pub const ARCHIVE_KEY: &str = "market_news_archive_v1";

/// Articles older than this are pruned (7 days)
pub const RETENTION_WINDOW_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Number of most recent articles kept when the full list does not fit
pub const TRUNCATED_ARCHIVE_LEN: usize = 200;

/// Configuration for [`LocalArchive`]
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub key: String,
    pub retention_ms: i64,
    pub truncated_len: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            key: ARCHIVE_KEY.to_string(),
            retention_ms: RETENTION_WINDOW_MS,
            truncated_len: TRUNCATED_ARCHIVE_LEN,
        }
    }
}

/// Result of a save; callers may ignore it, the returned article list never depends on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The full list was persisted
    Saved { count: usize },
    /// The full list was rejected for capacity; only the most recent `count` were persisted
    Truncated { count: usize, dropped: usize },
    /// Nothing was persisted
    Failed { reason: String },
}

impl SaveOutcome {
    pub fn is_persisted(&self) -> bool {
        !matches!(self, SaveOutcome::Failed { .. })
    }
}

/// Persisted article collection
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Read the archive; corrupt or unreadable storage yields an empty list
    async fn load(&self) -> Vec<Article>;

    /// Superset merge of `fresh` over `archived`, pruned by retention, newest first
    fn merge(&self, archived: Vec<Article>, fresh: Vec<Article>, now: DateTime<Utc>) -> Vec<Article>;

    /// Persist the list, degrading to a truncated copy when it does not fit
    async fn save(&self, articles: &[Article]) -> SaveOutcome;
}

/// Merge two article lists keyed by id
///
/// `archived` seeds the map and every `fresh` article overwrites it, so a
/// re-fetched item always wins while archived items missing from the
/// current fetch survive. Only articles published after
/// `now_ms - retention_ms` are kept. Output is sorted by `published_at`
/// descending; equal timestamps keep first-seen order.
pub fn merge_articles(
    archived: Vec<Article>,
    fresh: Vec<Article>,
    now_ms: i64,
    retention_ms: i64,
) -> Vec<Article> {
    let mut by_id: IndexMap<String, Article> =
        IndexMap::with_capacity(archived.len() + fresh.len());

    for article in archived.into_iter().chain(fresh) {
        by_id.insert(article.id.clone(), article);
    }

    let cutoff = now_ms - retention_ms;
    let mut merged: Vec<Article> = by_id
        .into_values()
        .filter(|a| a.published_at > cutoff)
        .collect();

    sort_newest_first(&mut merged);
    merged
}

fn decode_archive(blob: Option<String>) -> Result<(Vec<Article>, usize), ArchiveError> {
    match blob {
        Some(blob) => Ok((serde_json::from_str(&blob)?, blob.len())),
        None => Ok((Vec::new(), 0)),
    }
}

fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// Archive statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveStats {
    pub count: usize,
    pub newest_published_at: Option<i64>,
    pub oldest_published_at: Option<i64>,
    pub bytes: usize,
}

/// Archive persisted as a single JSON blob in a [`KeyValueStore`]
pub struct LocalArchive {
    store: Arc<dyn KeyValueStore>,
    config: ArchiveConfig,
    /// Serializes writers so two saves never interleave their retry steps
    write_lock: Mutex<()>,
}

impl LocalArchive {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, ArchiveConfig::default())
    }

    pub fn with_config(store: Arc<dyn KeyValueStore>, config: ArchiveConfig) -> Self {
        info!("Initializing archive under key: {}", config.key);
        Self {
            store,
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// Run a store operation off the async workers
    async fn with_store<T, F>(&self, op: F) -> Result<T, ArchiveError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn KeyValueStore, &str) -> Result<T, ArchiveError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let key = self.config.key.clone();
        tokio::task::spawn_blocking(move || op(store.as_ref(), &key))
            .await
            .map_err(|e| ArchiveError::Io(format!("Storage task failed: {}", e)))?
    }

    fn read_archive(&self) -> Result<(Vec<Article>, usize), ArchiveError> {
        decode_archive(self.store.get(&self.config.key)?)
    }

    async fn write_archive(&self, articles: &[Article]) -> Result<usize, ArchiveError> {
        let blob = serde_json::to_string(articles)?;
        self.with_store(move |store, key| {
            store.set(key, &blob)?;
            Ok(blob.len())
        })
        .await
    }

    /// Count and age range of the stored archive
    pub fn stats(&self) -> Result<ArchiveStats, ArchiveError> {
        let (articles, bytes) = self.read_archive()?;
        Ok(ArchiveStats {
            count: articles.len(),
            newest_published_at: articles.iter().map(|a| a.published_at).max(),
            oldest_published_at: articles.iter().map(|a| a.published_at).min(),
            bytes,
        })
    }
}

#[async_trait]
impl ArchiveStore for LocalArchive {
    #[instrument(skip(self), fields(key = %self.config.key))]
    async fn load(&self) -> Vec<Article> {
        let loaded = self
            .with_store(|store, key| match decode_archive(store.get(key)?) {
                Err(ArchiveError::Serialization(e)) => {
                    // stale schema or garbage; drop it so the next save starts clean
                    warn!("Discarding undecodable archive: {}", e);
                    store.remove(key)?;
                    Ok((Vec::new(), 0))
                }
                other => other,
            })
            .await;

        match loaded {
            Ok((articles, bytes)) => {
                debug!("Loaded {} archived articles ({} bytes)", articles.len(), bytes);
                articles
            }
            Err(e) => {
                warn!("Archive unreadable, starting from empty: {}", e);
                Vec::new()
            }
        }
    }

    fn merge(&self, archived: Vec<Article>, fresh: Vec<Article>, now: DateTime<Utc>) -> Vec<Article> {
        merge_articles(archived, fresh, now.timestamp_millis(), self.config.retention_ms)
    }

    #[instrument(skip(self, articles), fields(key = %self.config.key, count = articles.len()))]
    async fn save(&self, articles: &[Article]) -> SaveOutcome {
        let _guard = self.write_lock.lock().await;

        let err = match self.write_archive(articles).await {
            Ok(bytes) => {
                debug!("Archived {} articles ({} bytes)", articles.len(), bytes);
                return SaveOutcome::Saved {
                    count: articles.len(),
                };
            }
            Err(e) => e,
        };

        if !err.is_capacity() {
            warn!("Failed to persist archive: {}", err);
            return SaveOutcome::Failed {
                reason: err.to_string(),
            };
        }

        warn!(
            "Archive of {} articles does not fit ({}), keeping the {} most recent",
            articles.len(),
            err,
            self.config.truncated_len
        );

        let mut recent = articles.to_vec();
        sort_newest_first(&mut recent);
        recent.truncate(self.config.truncated_len);

        match self.write_archive(&recent).await {
            Ok(bytes) => {
                info!("Archived truncated list of {} articles ({} bytes)", recent.len(), bytes);
                SaveOutcome::Truncated {
                    count: recent.len(),
                    dropped: articles.len() - recent.len(),
                }
            }
            Err(e) => {
                error!("Failed to persist truncated archive: {}", e);
                SaveOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
