//! Feed Source Registry
//!
//! Curated list of market news feeds. The list is static; the orchestrator
//! fetches every entry on each refresh cycle.

use dashboard_core::{FeedSource, NewsCategory};

/// Curated list of RSS feeds for the markets dashboard
pub fn get_market_feeds() -> Vec<FeedSource> {
    vec![
        // Forex
        FeedSource::new(
            "https://www.fxstreet.com/rss/news",
            NewsCategory::Forex,
            "FXStreet",
            1,
        ),
        FeedSource::new(
            "https://www.investing.com/rss/news_1.rss",
            NewsCategory::Forex,
            "Investing.com",
            2,
        ),
        // Macro / central banks
        FeedSource::new(
            "https://www.federalreserve.gov/feeds/press_all.xml",
            NewsCategory::Economy,
            "Federal Reserve",
            1,
        ),
        FeedSource::new(
            "https://www.investing.com/rss/news_14.rss",
            NewsCategory::Economy,
            "Investing.com",
            3,
        ),
        // Equities
        FeedSource::new(
            "https://search.cnbc.com/rs/search/combinedcms/view.xml?partnerId=wrss01&id=100003114",
            NewsCategory::Stocks,
            "CNBC",
            2,
        ),
        FeedSource::new(
            "https://feeds.content.dowjones.io/public/rss/mw_topstories",
            NewsCategory::Stocks,
            "MarketWatch",
            2,
        ),
        // Commodities
        FeedSource::new(
            "https://www.investing.com/rss/news_11.rss",
            NewsCategory::Commodities,
            "Investing.com",
            3,
        ),
        // Crypto
        FeedSource::new(
            "https://www.coindesk.com/arc/outboundfeeds/rss/",
            NewsCategory::Crypto,
            "CoinDesk",
            3,
        ),
        FeedSource::new(
            "https://cointelegraph.com/rss",
            NewsCategory::Crypto,
            "Cointelegraph",
            4,
        ),
    ]
}

/// Feeds ordered by priority (most important first), ties kept in registry order
///
/// Only used for display and documentation; article output order is always
/// by publication time.
pub fn sources_by_priority(feeds: &[FeedSource]) -> Vec<&FeedSource> {
    let mut ordered: Vec<&FeedSource> = feeds.iter().collect();
    ordered.sort_by_key(|f| f.priority);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_market_feeds() {
        let feeds = get_market_feeds();
        assert!(!feeds.is_empty());
        assert!(feeds.iter().any(|f| f.category == NewsCategory::Forex));
        assert!(feeds.iter().any(|f| f.source == "Federal Reserve"));

        let urls: HashSet<_> = feeds.iter().map(|f| f.url.as_str()).collect();
        assert_eq!(urls.len(), feeds.len(), "duplicate feed URL in registry");
    }

    #[test]
    fn test_sources_by_priority_is_stable() {
        let feeds = get_market_feeds();
        let ordered = sources_by_priority(&feeds);
        assert_eq!(ordered[0].source, "FXStreet");
        assert_eq!(ordered[1].source, "Federal Reserve");
        assert!(ordered.windows(2).all(|w| w[0].priority <= w[1].priority));
    }
}
