//! Content Normalizer
//!
//! Converts one raw proxy item plus its owning feed into a canonical
//! `Article`. All "is this field present and well-formed" decisions happen
//! here; a failure is returned for the single item and never aborts the feed.

use std::fmt::Display;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use dashboard_core::{Article, FeedSource, Sentiment};

use crate::error::NewsError;
use crate::types::RawFeedItem;

/// Character budget for summaries, excluding the ellipsis
pub const SUMMARY_MAX_CHARS: usize = 250;

const ELLIPSIS: &str = "...";

/// Stock images used when an item has no usable picture
pub const PLACEHOLDER_IMAGES: &[&str] = &[
    "https://images.unsplash.com/photo-1611974789855-9c2a0a7236a3?w=800&q=80",
    "https://images.unsplash.com/photo-1590283603385-17ffb3a7f29f?w=800&q=80",
    "https://images.unsplash.com/photo-1642790106117-e829e14a795f?w=800&q=80",
    "https://images.unsplash.com/photo-1535320903710-d993d3d77d29?w=800&q=80",
    "https://images.unsplash.com/photo-1526304640581-d334cdbbf45e?w=800&q=80",
    "https://images.unsplash.com/photo-1559526324-4b87b5e36e44?w=800&q=80",
    "https://images.unsplash.com/photo-1612178991541-b48cc8e92a4d?w=800&q=80",
    "https://images.unsplash.com/photo-1579532537598-459ecdaf39cc?w=800&q=80",
];

/// URL fragments of tracking pixels and ad-network images
const LOW_QUALITY_IMAGE_PATTERNS: &[&str] = &[
    "feedburner",
    "feedblitz",
    "doubleclick.net",
    "googlesyndication",
    "adservice",
    "/1x1.",
    "pixel.gif",
    "pixel.png",
    "spacer.gif",
];

/// Normalize one raw item into an article
///
/// `now` fixes the "today" used for the display timestamp; its time zone is
/// the one the timestamp is rendered in. Sentiment and breaking flags are
/// left at their defaults for the classifier to fill in.
pub fn normalize_item<Tz>(
    raw: &RawFeedItem,
    source: &FeedSource,
    now: &DateTime<Tz>,
) -> Result<Article, NewsError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let headline = non_empty(raw.title.as_deref())
        .map(|t| strip_html(t))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| NewsError::InvalidItem("missing title".to_string()))?;

    let pub_date = non_empty(raw.pub_date.as_deref())
        .ok_or_else(|| NewsError::InvalidItem(format!("missing pubDate for \"{}\"", headline)))?;
    let published = parse_pub_date(pub_date).ok_or_else(|| {
        NewsError::InvalidItem(format!("unparseable pubDate \"{}\" for \"{}\"", pub_date, headline))
    })?;

    let id = derive_id(raw, source, &headline);

    let markup = non_empty(raw.description.as_deref()).or(non_empty(raw.content.as_deref()));
    let summary = truncate_summary(&strip_html(markup.unwrap_or_default()));

    let author = non_empty(raw.author.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| source.source.clone());

    let image_url = resolve_image(raw).unwrap_or_else(|| {
        debug!("No usable image for \"{}\", using placeholder", headline);
        placeholder_image(&headline).to_string()
    });

    Ok(Article {
        id,
        summary,
        category: source.category,
        author,
        image_url,
        url: non_empty(raw.link.as_deref()).map(str::to_string),
        full_content: markup.map(str::to_string),
        published_at: published.timestamp_millis(),
        timestamp: format_timestamp(published, now),
        is_breaking: false,
        sentiment: Sentiment::Neutral,
        headline,
    })
}

/// Provider guid, else link, else "<source>-<headline>"
fn derive_id(raw: &RawFeedItem, source: &FeedSource, headline: &str) -> String {
    non_empty(raw.guid.as_deref())
        .or(non_empty(raw.link.as_deref()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}-{}", source.source, headline))
}

/// Parse a feed date: RFC 3339, RFC 2822, or the proxy's `YYYY-MM-DD HH:MM:SS` (UTC)
pub fn parse_pub_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Time of day when published on the same calendar day as `now`, else month and day
pub fn format_timestamp<Tz>(published: DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = published.with_timezone(&now.timezone());
    if local.date_naive() == now.date_naive() {
        local.format("%I:%M %p").to_string()
    } else {
        local.format("%b %-d").to_string()
    }
}

/// Thumbnail, else enclosure link, else first `src` in content/description markup.
/// `None` when nothing is found or the candidate looks like a tracker/ad.
fn resolve_image(raw: &RawFeedItem) -> Option<String> {
    let candidate = non_empty(raw.thumbnail.as_deref())
        .map(str::to_string)
        .or_else(|| {
            raw.enclosure
                .as_ref()
                .and_then(|e| non_empty(e.link.as_deref()))
                .map(str::to_string)
        })
        .or_else(|| raw.content.as_deref().and_then(extract_image_src))
        .or_else(|| raw.description.as_deref().and_then(extract_image_src))?;

    if is_low_quality_image(&candidate) {
        debug!("Rejecting low quality image: {}", candidate);
        return None;
    }
    Some(candidate)
}

/// First `src="..."` attribute in the markup
fn extract_image_src(html: &str) -> Option<String> {
    let src_pattern = regex::Regex::new(r#"src=["']([^"']+)["']"#).ok()?;
    let caps = src_pattern.captures(html)?;
    let url = caps.get(1)?.as_str().trim();
    (!url.is_empty()).then(|| url.to_string())
}

fn is_low_quality_image(url: &str) -> bool {
    let lower = url.to_lowercase();
    LOW_QUALITY_IMAGE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Deterministic stock image for a seed string
pub fn placeholder_image(seed: &str) -> &'static str {
    let index = seed_hash(seed).unsigned_abs() as usize % PLACEHOLDER_IMAGES.len();
    PLACEHOLDER_IMAGES[index]
}

/// Polynomial rolling hash over UTF-16 code units: `hash = c + (hash << 5) - hash`
fn seed_hash(seed: &str) -> i32 {
    seed.encode_utf16().fold(0i32, |hash, c| {
        i32::from(c).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

/// Strip HTML tags, decode common entities and collapse whitespace
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_summary(text: &str) -> String {
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawEnclosure;
    use dashboard_core::NewsCategory;

    fn source() -> FeedSource {
        FeedSource::new("https://www.fxstreet.com/rss/news", NewsCategory::Forex, "FXStreet", 1)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 12, 18, 30, 0).unwrap()
    }

    fn item() -> RawFeedItem {
        RawFeedItem {
            title: Some("EUR/USD soars on hawkish Fed".to_string()),
            description: Some("<p>Markets rallied &nbsp;today</p>".to_string()),
            pub_date: Some("2024-03-12T10:00:00Z".to_string()),
            link: Some("https://x.com/a".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_scenario_item() {
        let article = normalize_item(&item(), &source(), &now()).unwrap();
        assert_eq!(article.id, "https://x.com/a");
        assert_eq!(article.summary, "Markets rallied today");
        assert_eq!(article.headline, "EUR/USD soars on hawkish Fed");
        assert_eq!(article.author, "FXStreet");
        assert_eq!(article.category, NewsCategory::Forex);
        assert_eq!(article.url.as_deref(), Some("https://x.com/a"));
        assert_eq!(article.published_at, 1_710_237_600_000);
        assert_eq!(article.timestamp, "10:00 AM");
        assert!(PLACEHOLDER_IMAGES.contains(&article.image_url.as_str()));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let first = normalize_item(&item(), &source(), &now()).unwrap();
        let second = normalize_item(&item(), &source(), &now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_id_priority() {
        let mut raw = item();
        raw.guid = Some("guid-42".to_string());
        assert_eq!(normalize_item(&raw, &source(), &now()).unwrap().id, "guid-42");

        raw.guid = Some("   ".to_string());
        raw.link = None;
        assert_eq!(
            normalize_item(&raw, &source(), &now()).unwrap().id,
            "FXStreet-EUR/USD soars on hawkish Fed"
        );
    }

    #[test]
    fn test_invalid_dates_are_rejected() {
        let mut raw = item();
        raw.pub_date = Some("yesterday-ish".to_string());
        assert!(matches!(
            normalize_item(&raw, &source(), &now()),
            Err(NewsError::InvalidItem(_))
        ));

        raw.pub_date = None;
        assert!(normalize_item(&raw, &source(), &now()).is_err());
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let mut raw = item();
        raw.title = Some("<b></b>".to_string());
        assert!(normalize_item(&raw, &source(), &now()).is_err());
    }

    #[test]
    fn test_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 12, 10, 0, 0).unwrap();
        assert_eq!(parse_pub_date("2024-03-12 10:00:00"), Some(expected));
        assert_eq!(parse_pub_date("Tue, 12 Mar 2024 10:00:00 +0000"), Some(expected));
        assert_eq!(parse_pub_date("2024-03-12T12:00:00+02:00"), Some(expected));
    }

    #[test]
    fn test_timestamp_other_day() {
        let published = Utc.with_ymd_and_hms(2024, 3, 9, 22, 15, 0).unwrap();
        assert_eq!(format_timestamp(published, &now()), "Mar 9");
    }

    #[test]
    fn test_image_chain_order() {
        let mut raw = item();
        raw.content = Some(r#"<img src="https://cdn.example/content.jpg">"#.to_string());
        raw.description = Some(r#"<img src="https://cdn.example/desc.jpg">"#.to_string());
        let article = normalize_item(&raw, &source(), &now()).unwrap();
        assert_eq!(article.image_url, "https://cdn.example/content.jpg");

        raw.enclosure = Some(RawEnclosure {
            link: Some("https://cdn.example/enclosure.jpg".to_string()),
            mime_type: None,
        });
        let article = normalize_item(&raw, &source(), &now()).unwrap();
        assert_eq!(article.image_url, "https://cdn.example/enclosure.jpg");

        raw.thumbnail = Some("https://cdn.example/thumb.jpg".to_string());
        let article = normalize_item(&raw, &source(), &now()).unwrap();
        assert_eq!(article.image_url, "https://cdn.example/thumb.jpg");
    }

    #[test]
    fn test_tracking_pixel_falls_back_to_placeholder() {
        let mut raw = item();
        raw.thumbnail = Some("https://feeds.feedburner.com/~r/markets/~4/abc".to_string());
        let article = normalize_item(&raw, &source(), &now()).unwrap();
        assert_eq!(article.image_url, placeholder_image("EUR/USD soars on hawkish Fed"));
    }

    #[test]
    fn test_image_names_containing_pixel_are_kept() {
        let mut raw = item();
        raw.thumbnail = Some("https://cdn.example/reviews/pixel-8-review.jpg".to_string());
        let article = normalize_item(&raw, &source(), &now()).unwrap();
        assert_eq!(article.image_url, "https://cdn.example/reviews/pixel-8-review.jpg");

        raw.thumbnail = Some("https://ads.example/track/1x1.gif?id=9".to_string());
        let article = normalize_item(&raw, &source(), &now()).unwrap();
        assert!(PLACEHOLDER_IMAGES.contains(&article.image_url.as_str()));
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        let a = placeholder_image("Gold hits record");
        let b = placeholder_image("Gold hits record");
        assert_eq!(a, b);
        assert_eq!(seed_hash(""), 0);
        assert_eq!(seed_hash("a"), 97);
        assert_eq!(seed_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_summary_truncation() {
        let mut raw = item();
        raw.description = Some(format!("<p>{}</p>", "é".repeat(300)));
        let article = normalize_item(&raw, &source(), &now()).unwrap();
        assert_eq!(article.summary.chars().count(), SUMMARY_MAX_CHARS + ELLIPSIS.len());
        assert!(article.summary.ends_with("..."));
        assert_eq!(article.full_content.as_deref(), raw.description.as_deref());
    }

    #[test]
    fn test_summary_falls_back_to_content() {
        let mut raw = item();
        raw.description = None;
        raw.content = Some("<div>Full <em>body</em></div>".to_string());
        let article = normalize_item(&raw, &source(), &now()).unwrap();
        assert_eq!(article.summary, "Full body");
    }
}
