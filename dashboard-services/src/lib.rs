//! Business logic services for the Market Dashboard
//!
//! This crate provides the service layer of the news pipeline: the
//! persisted article archive, the aggregation orchestrator that fans out
//! feed fetches and merges them into the archive, and the background
//! refresh service the presentation layer reads snapshots from.

pub mod archive;
pub mod config;
pub mod error;
pub mod kv_store;
pub mod news_aggregator;
pub mod news_service;

pub use archive::{
    merge_articles, ArchiveConfig, ArchiveStats, ArchiveStore, LocalArchive, SaveOutcome,
    ARCHIVE_KEY, RETENTION_WINDOW_MS, TRUNCATED_ARCHIVE_LEN,
};
pub use config::DashboardConfig;
pub use error::{ArchiveError, NewsServiceError};
pub use kv_store::{KeyValueStore, MemoryKvStore, SqliteKvStore};
pub use news_aggregator::{NewsAggregator, NewsAggregatorConfig};
pub use news_service::{CycleReport, NewsService, NewsServiceConfig};
