//! Feed source configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Market category a feed (and every article it yields) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewsCategory {
    Forex,
    Crypto,
    Stocks,
    Commodities,
    Economy,
}

impl NewsCategory {
    /// Get the full display name
    pub fn display_name(&self) -> &'static str {
        match self {
            NewsCategory::Forex => "Forex",
            NewsCategory::Crypto => "Crypto",
            NewsCategory::Stocks => "Stocks",
            NewsCategory::Commodities => "Commodities",
            NewsCategory::Economy => "Economy",
        }
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for NewsCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forex" | "fx" => Ok(NewsCategory::Forex),
            "crypto" => Ok(NewsCategory::Crypto),
            "stocks" | "equities" => Ok(NewsCategory::Stocks),
            "commodities" => Ok(NewsCategory::Commodities),
            "economy" | "macro" => Ok(NewsCategory::Economy),
            _ => Err(format!("Unknown news category: {}", s)),
        }
    }
}

/// A configured RSS feed, consumed through the feed-to-JSON proxy
///
/// Immutable at runtime. `priority` is informational (lower is more
/// important) and never changes the order articles are returned in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    /// RSS feed URL
    pub url: String,
    /// Category stamped onto every article from this feed
    pub category: NewsCategory,
    /// Display name of the publisher
    pub source: String,
    /// Informational priority, 1 = highest
    pub priority: u8,
}

impl FeedSource {
    pub fn new(
        url: impl Into<String>,
        category: NewsCategory,
        source: impl Into<String>,
        priority: u8,
    ) -> Self {
        Self {
            url: url.into(),
            category,
            source: source.into(),
            priority,
        }
    }
}
