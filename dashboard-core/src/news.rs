//! News data structures for the market dashboard

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::NewsCategory;

/// Coarse market sentiment of an article
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Sentiment::Bullish => "Bullish",
            Sentiment::Bearish => "Bearish",
            Sentiment::Neutral => "Neutral",
        };
        write!(f, "{}", label)
    }
}

/// A normalized news article
///
/// Serialized field names are camelCase; this is the persisted archive format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Stable identity (guid, else link, else source + headline)
    pub id: String,
    /// Article title
    pub headline: String,
    /// Plain-text excerpt, at most 250 characters plus an ellipsis
    pub summary: String,
    /// Category of the owning feed
    pub category: NewsCategory,
    /// Author, or the feed's source name when the item has none
    pub author: String,
    /// Article image, or a stock placeholder
    pub image_url: String,
    /// Original article link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Raw description/content markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
    /// Publication time in epoch milliseconds
    pub published_at: i64,
    /// Display string derived from `published_at`
    pub timestamp: String,
    /// High market-impact flag
    #[serde(default)]
    pub is_breaking: bool,
    #[serde(default)]
    pub sentiment: Sentiment,
}

/// Parameters for filtering an article snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleQuery {
    /// Case-insensitive text matched against headline and summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<NewsCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    /// Only return breaking articles
    #[serde(default)]
    pub breaking_only: bool,
    /// Maximum number of results to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            query: None,
            category: None,
            sentiment: None,
            breaking_only: false,
            limit: default_limit(),
        }
    }
}

impl ArticleQuery {
    /// Does the article pass every filter set on this query
    pub fn matches(&self, article: &Article) -> bool {
        if self.breaking_only && !article.is_breaking {
            return false;
        }
        if self.category.is_some_and(|c| c != article.category) {
            return false;
        }
        if self.sentiment.is_some_and(|s| s != article.sentiment) {
            return false;
        }
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                article.headline.to_lowercase().contains(&q)
                    || article.summary.to_lowercase().contains(&q)
            }
            _ => true,
        }
    }

    /// Filter a snapshot, preserving its order
    pub fn apply(&self, articles: &[Article]) -> Vec<Article> {
        articles
            .iter()
            .filter(|a| self.matches(a))
            .take(self.limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str, headline: &str, category: NewsCategory, breaking: bool) -> Article {
        Article {
            id: id.to_string(),
            headline: headline.to_string(),
            summary: String::new(),
            category,
            author: "Desk".to_string(),
            image_url: "https://img.example/1.jpg".to_string(),
            url: None,
            full_content: None,
            published_at: 1_710_237_600_000,
            timestamp: "Mar 12".to_string(),
            is_breaking: breaking,
            sentiment: Sentiment::Neutral,
        }
    }

    #[test]
    fn test_article_serializes_camel_case() {
        let a = article("a", "Gold climbs", NewsCategory::Commodities, true);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["imageUrl"], "https://img.example/1.jpg");
        assert_eq!(json["publishedAt"], 1_710_237_600_000i64);
        assert_eq!(json["isBreaking"], true);
        assert_eq!(json["sentiment"], "Neutral");
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_query_filters_and_limits() {
        let articles = vec![
            article("1", "Fed holds rates", NewsCategory::Economy, true),
            article("2", "Bitcoin rallies", NewsCategory::Crypto, false),
            article("3", "ECB signals cut", NewsCategory::Economy, true),
        ];

        let query = ArticleQuery {
            category: Some(NewsCategory::Economy),
            ..Default::default()
        };
        let ids: Vec<_> = query.apply(&articles).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let query = ArticleQuery {
            query: Some("BITCOIN".to_string()),
            ..Default::default()
        };
        assert_eq!(query.apply(&articles).len(), 1);

        let query = ArticleQuery {
            breaking_only: true,
            limit: 1,
            ..Default::default()
        };
        let result = query.apply(&articles);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "1");
    }
}
