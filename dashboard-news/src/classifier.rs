//! Signal Classifier
//!
//! Keyword heuristic for sentiment and breaking-news flags. Matching is
//! plain case-insensitive substring search, so word fragments count
//! ("resistance" inside any sentence flags Bearish). There is one keyword
//! list per concern; keep them here rather than forking copies elsewhere.

use dashboard_core::{Article, Sentiment};

/// Checked first: a bullish hit wins even when a bearish keyword also matches
pub const BULLISH_KEYWORDS: &[&str] = &[
    "surge",
    "soar",
    "rally",
    "rallies",
    "jump",
    "gain",
    "climb",
    "rebound",
    "record high",
    "all-time high",
    "bull",
    "beat",
    "upgrade",
    "boom",
    "breakout",
    "optimism",
    "outperform",
    "support",
];

pub const BEARISH_KEYWORDS: &[&str] = &[
    "plunge",
    "crash",
    "slump",
    "tumble",
    "sink",
    "fall",
    "drop",
    "decline",
    "slide",
    "loss",
    "bear",
    "downgrade",
    "recession",
    "sell-off",
    "selloff",
    "weak",
    "fear",
    "miss",
    "resistance",
];

/// High-impact terms: central banks and their heads, key macro releases, crisis words
pub const BREAKING_KEYWORDS: &[&str] = &[
    "fed ",
    "federal reserve",
    "fomc",
    "powell",
    "ecb",
    "lagarde",
    "boj",
    "bank of japan",
    "bank of england",
    "central bank",
    "rate hike",
    "rate cut",
    "hike",
    "hawkish",
    "dovish",
    "cpi",
    "nfp",
    "non-farm",
    "nonfarm",
    "payrolls",
    "gdp",
    "pmi",
    "inflation",
    "crisis",
    "crash",
    "default",
    "bankruptcy",
    "emergency",
    "sanctions",
    "breaking",
];

/// Derived signals for one article
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signals {
    pub sentiment: Sentiment,
    pub is_breaking: bool,
}

impl Signals {
    /// Stamp these signals onto an article
    pub fn apply(self, article: &mut Article) {
        article.sentiment = self.sentiment;
        article.is_breaking = self.is_breaking;
    }
}

/// Sentiment of a text: Bullish if any bullish keyword occurs, else Bearish
/// if any bearish keyword occurs, else Neutral
pub fn detect_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    if BULLISH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Sentiment::Bullish
    } else if BEARISH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Sentiment::Bearish
    } else {
        Sentiment::Neutral
    }
}

/// Does the text mention any high-impact term
pub fn detect_breaking(text: &str) -> bool {
    let lower = text.to_lowercase();
    BREAKING_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Classify the concatenation of headline and cleaned summary
pub fn classify(headline: &str, summary: &str) -> Signals {
    let text = format!("{} {}", headline, summary);
    Signals {
        sentiment: detect_sentiment(&text),
        is_breaking: detect_breaking(&text),
    }
}
