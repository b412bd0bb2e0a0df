//! Core types for the Market Dashboard
//!
//! This crate defines the shared data structures used across the dashboard,
//! including the canonical article record, feed source configuration and
//! the workspace error type.

pub mod error;
pub mod feed;
pub mod news;

pub use error::{DashboardError, DashboardResult};
pub use feed::{FeedSource, NewsCategory};
pub use news::{Article, ArticleQuery, Sentiment};
