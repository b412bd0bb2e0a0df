//! Payload types for the feed-to-JSON proxy
//!
//! The proxy converts an RSS feed into
//! `{ status, items: [{ title, description, content, pubDate, link, guid,
//! thumbnail, enclosure: { link }, author }] }`. Providers disagree on which
//! fields they fill in, so every field here is optional and decoded leniently:
//! a field of the wrong JSON shape is treated as absent instead of failing
//! the whole item.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::NewsError;

/// Top-level proxy response
#[derive(Debug, Default, Deserialize)]
pub struct ProxyResponse {
    /// "ok" on success, anything else on failure
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    /// Error message when status is not "ok"
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    /// Raw items, decoded one at a time so one bad item cannot sink the rest
    #[serde(default, deserialize_with = "lenient")]
    pub items: Option<Vec<Value>>,
}

impl ProxyResponse {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }
}

/// A single feed item as produced by the proxy
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFeedItem {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<String>,
    #[serde(rename = "pubDate", default, deserialize_with = "lenient")]
    pub pub_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub guid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub enclosure: Option<RawEnclosure>,
    #[serde(default, deserialize_with = "lenient")]
    pub author: Option<String>,
}

/// Enclosure/attachment of a feed item
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEnclosure {
    #[serde(default, deserialize_with = "lenient")]
    pub link: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub mime_type: Option<String>,
}

impl RawFeedItem {
    /// Decode one item from the proxy's `items` array
    pub fn from_value(value: Value) -> Result<Self, NewsError> {
        if !value.is_object() {
            return Err(NewsError::InvalidItem(format!(
                "expected an object, got {}",
                value
            )));
        }
        serde_json::from_value(value).map_err(|e| NewsError::InvalidItem(e.to_string()))
    }
}

/// Decode a field, treating a shape mismatch (or null) as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`], but only a JSON object counts as present
///
/// Structs whose fields all default would otherwise decode from `[]`.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrong_shapes_become_absent() {
        let raw = json!({
            "title": "Oil slides",
            "pubDate": 1710237600,
            "enclosure": [],
            "thumbnail": null,
            "author": {"name": "x"}
        });
        let item = RawFeedItem::from_value(raw).unwrap();
        assert_eq!(item.title.as_deref(), Some("Oil slides"));
        assert!(item.pub_date.is_none());
        assert!(item.enclosure.is_none());
        assert!(item.thumbnail.is_none());
        assert!(item.author.is_none());
    }

    #[test]
    fn test_enclosure_link() {
        let raw = json!({"enclosure": {"link": "https://cdn.example/a.jpg", "type": "image/jpeg"}});
        let item = RawFeedItem::from_value(raw).unwrap();
        let enclosure = item.enclosure.unwrap();
        assert_eq!(enclosure.link.as_deref(), Some("https://cdn.example/a.jpg"));
        assert_eq!(enclosure.mime_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_empty_enclosure_array_is_absent() {
        let item = RawFeedItem::from_value(json!({"title": "Gold", "enclosure": []})).unwrap();
        assert_eq!(item.enclosure, None);

        let item = RawFeedItem::from_value(json!({"enclosure": {}})).unwrap();
        assert_eq!(item.enclosure, Some(RawEnclosure::default()));
    }

    #[test]
    fn test_non_object_item_is_rejected() {
        assert!(RawFeedItem::from_value(json!("just a string")).is_err());
    }

    #[test]
    fn test_proxy_response_status() {
        let ok: ProxyResponse = serde_json::from_value(json!({"status": "ok", "items": []})).unwrap();
        assert!(ok.is_ok());
        assert_eq!(ok.items.map(|i| i.len()), Some(0));

        let err: ProxyResponse =
            serde_json::from_value(json!({"status": "error", "message": "rate limited"})).unwrap();
        assert!(!err.is_ok());
        assert!(err.items.is_none());
    }
}
