//! Market Dashboard host process
//!
//! Wires the feed proxy client, the SQLite-backed archive and the
//! aggregation services together, then keeps the news snapshot fresh
//! until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dashboard_core::ArticleQuery;
use dashboard_news::{get_market_feeds, FeedProxyClient};
use dashboard_services::{DashboardConfig, NewsAggregator, NewsService};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,dashboard_services=debug")),
        )
        .init();

    info!("Starting Market Dashboard");

    let config = DashboardConfig::from_env().context("Invalid configuration")?;

    // Archive storage
    info!("Opening news archive at: {}", config.archive_db_path.display());
    let archive = Arc::new(config.open_archive()?);

    match archive.stats() {
        Ok(stats) => info!("Archive holds {} articles ({} bytes)", stats.count, stats.bytes),
        Err(e) => warn!("Archive unreadable, it will be rebuilt: {}", e),
    }

    // News pipeline
    let fetcher = Arc::new(FeedProxyClient::with_config(config.proxy.clone()));
    let news_service = Arc::new(NewsService::new(
        fetcher,
        archive.clone(),
        get_market_feeds(),
        config.news.clone(),
    ));

    let aggregator = Arc::new(NewsAggregator::new(news_service, config.aggregator.clone()));
    let refresh_task = Arc::clone(&aggregator).start();

    // Periodically report the breaking headlines of the current snapshot
    let reporter = Arc::clone(&aggregator);
    let report_every = Duration::from_secs(config.aggregator.refresh_interval_secs.max(1));
    let report_task = tokio::spawn(async move {
        let breaking = ArticleQuery {
            breaking_only: true,
            limit: 5,
            ..ArticleQuery::default()
        };
        let mut ticker = tokio::time::interval(report_every);
        loop {
            ticker.tick().await;
            if reporter.last_refreshed().await.is_none() {
                continue;
            }
            for article in reporter.latest(&breaking).await {
                info!(
                    "[{}] {} ({}, {})",
                    article.category, article.headline, article.author, article.timestamp
                );
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down");
    refresh_task.abort();
    report_task.abort();

    if let Ok(stats) = archive.stats() {
        info!(
            "Archive holds {} articles (newest {:?}, oldest {:?})",
            stats.count, stats.newest_published_at, stats.oldest_published_at
        );
    }

    Ok(())
}
