//! Typed views over the content collections.
//!
//! Documents stay schemaless at the store boundary; these types decode
//! them leniently (missing fields default) for display and validation, so
//! field access is explicit instead of stringly-typed at every call site.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;

/// Content collection names.
pub const SERMONS_COLLECTION: &str = "sermons";
pub const EVENTS_COLLECTION: &str = "events";
pub const MINISTRIES_COLLECTION: &str = "ministries";
pub const NEWS_COLLECTION: &str = "news";
pub const PRAYERS_COLLECTION: &str = "prayers";

fn decode_fields<T: Default + serde::de::DeserializeOwned>(doc: &Document) -> T {
    serde_json::from_value(Value::Object(doc.fields.clone())).unwrap_or_default()
}

/// Sorts documents most-recent-first by their `createdAt` stamp.
/// Documents without one sink to the end in their original order.
pub fn sort_latest_first(docs: &mut [Document]) {
    docs.sort_by_key(|doc| std::cmp::Reverse(doc.created_at().unwrap_or(i64::MIN)));
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sermon {
    #[serde(skip_deserializing)]
    pub id: String,
    pub title: String,
    pub speaker: String,
    pub scripture: String,
    pub video_url: String,
    pub date: String,
}

impl Sermon {
    pub fn from_document(doc: &Document) -> Self {
        let mut sermon: Self = decode_fields(doc);
        sermon.id = doc.id.clone();
        sermon
    }
}

impl fmt::Display for Sermon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if !self.speaker.is_empty() {
            write!(f, " — {}", self.speaker)?;
        }
        if !self.scripture.is_empty() {
            write!(f, " ({})", self.scripture)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    #[serde(skip_deserializing)]
    pub id: String,
    pub title: String,
    pub location: String,
    pub starts_at: String,
    pub description: String,
    pub image_url: String,
}

impl Event {
    pub fn from_document(doc: &Document) -> Self {
        let mut event: Self = decode_fields(doc);
        event.id = doc.id.clone();
        event
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if !self.starts_at.is_empty() {
            write!(f, " @ {}", self.starts_at)?;
        }
        if !self.location.is_empty() {
            write!(f, " ({})", self.location)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Ministry {
    #[serde(skip_deserializing)]
    pub id: String,
    pub name: String,
    pub leader: String,
    pub description: String,
    pub image_url: String,
}

impl Ministry {
    pub fn from_document(doc: &Document) -> Self {
        let mut ministry: Self = decode_fields(doc);
        ministry.id = doc.id.clone();
        ministry
    }
}

impl fmt::Display for Ministry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.leader.is_empty() {
            write!(f, " — led by {}", self.leader)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(skip_deserializing)]
    pub id: String,
    pub title: String,
    pub body: String,
    pub image_url: String,
}

impl NewsItem {
    pub fn from_document(doc: &Document) -> Self {
        let mut item: Self = decode_fields(doc);
        item.id = doc.id.clone();
        item
    }
}

impl fmt::Display for NewsItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrayerRequest {
    #[serde(skip_deserializing)]
    pub id: String,
    pub name: String,
    pub request: String,
}

impl PrayerRequest {
    pub fn from_document(doc: &Document) -> Self {
        let mut prayer: Self = decode_fields(doc);
        prayer.id = doc.id.clone();
        prayer
    }
}

impl fmt::Display for PrayerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.request)
        } else {
            write!(f, "{}: {}", self.name, self.request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn doc(id: &str, value: Value) -> Document {
        let fields = match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        };
        Document::new(id, fields)
    }

    #[test]
    fn test_sermon_decodes_leniently() {
        let sermon = Sermon::from_document(&doc(
            "s1",
            json!({ "title": "On Grace", "speaker": "Pr. Lee", "unknownField": 3 }),
        ));
        assert_eq!(sermon.id, "s1");
        assert_eq!(sermon.title, "On Grace");
        assert_eq!(sermon.scripture, "");
        assert_eq!(sermon.to_string(), "On Grace — Pr. Lee");
    }

    #[test]
    fn test_empty_document_decodes_to_defaults() {
        let event = Event::from_document(&Document::new("e1", Map::new()));
        assert_eq!(event.id, "e1");
        assert_eq!(event.title, "");
    }

    #[test]
    fn test_sort_latest_first() {
        let mut docs = vec![
            doc("a", json!({ "createdAt": 100 })),
            doc("b", json!({})),
            doc("c", json!({ "createdAt": 300 })),
            doc("d", json!({ "createdAt": 200 })),
        ];
        sort_latest_first(&mut docs);
        let order: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(order, ["c", "d", "a", "b"]);
    }
}
