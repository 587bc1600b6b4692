//! Typed settings documents.
//!
//! Several logically distinct configuration objects share the physical
//! "settings" collection and are told apart by well-known identifiers.
//! Each type here carries a hardcoded default; incoming documents are
//! merged over that default so missing fields fall back deterministically.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known identifiers inside the settings collection.
pub const HOME_CONFIG_ID: &str = "homeConfig";
pub const WELCOME_DATA_ID: &str = "welcomeData";
pub const ABOUT_DATA_ID: &str = "aboutData";
pub const TEN_YEARS_DATA_ID: &str = "tenYearsData";

/// Home page section keys in their default order. Keys missing from a
/// persisted order are appended in this relative order, so sections added
/// after a config was saved still surface without a manual migration.
pub const DEFAULT_SECTION_ORDER: &[&str] = &[
    "hero",
    "verse",
    "sermons",
    "events",
    "ministries",
    "news",
    "prayer",
];

/// Home page configuration (`homeConfig`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HomeConfig {
    pub section_order: Vec<String>,
    pub banner_title: String,
    pub banner_subtitle: String,
    pub banner_image_url: String,
    pub show_live_banner: bool,
    pub live_stream_url: String,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            section_order: DEFAULT_SECTION_ORDER
                .iter()
                .map(|s| s.to_string())
                .collect(),
            banner_title: "Welcome Home".to_string(),
            banner_subtitle: "Join us this Sunday".to_string(),
            banner_image_url: String::new(),
            show_live_banner: false,
            live_stream_url: String::new(),
        }
    }
}

impl HomeConfig {
    /// The render order after reconciling the persisted order with the
    /// defaults.
    pub fn effective_sections(&self) -> Vec<String> {
        reconcile_section_order(&self.section_order, DEFAULT_SECTION_ORDER)
    }
}

/// Welcome block content (`welcomeData`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WelcomeData {
    pub title: String,
    pub message: String,
    pub image_url: String,
}

impl Default for WelcomeData {
    fn default() -> Self {
        Self {
            title: "Welcome".to_string(),
            message: "We are glad you are here.".to_string(),
            image_url: String::new(),
        }
    }
}

/// About page content (`aboutData`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AboutData {
    pub title: String,
    pub history: String,
    pub mission: String,
    pub pastor_name: String,
    pub pastor_photo_url: String,
}

impl Default for AboutData {
    fn default() -> Self {
        Self {
            title: "About Us".to_string(),
            history: String::new(),
            mission: String::new(),
            pastor_name: String::new(),
            pastor_photo_url: String::new(),
        }
    }
}

/// Anniversary campaign content (`tenYearsData`), including the decorative
/// frame the photo compositor layers over member photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TenYearsData {
    pub title: String,
    pub message: String,
    pub frame_image_url: String,
}

impl Default for TenYearsData {
    fn default() -> Self {
        Self {
            title: "Ten Years Together".to_string(),
            message: String::new(),
            frame_image_url: String::new(),
        }
    }
}

/// Reconciles a persisted section order with the default order: the
/// persisted keys come first, then any default keys missing from it, in
/// their default relative order.
pub fn reconcile_section_order(persisted: &[String], default: &[&str]) -> Vec<String> {
    let mut effective: Vec<String> = persisted.to_vec();
    for key in default {
        if !persisted.iter().any(|p| p == key) {
            effective.push(key.to_string());
        }
    }
    effective
}

/// Merges a settings document's fields over the type's default object and
/// decodes the result. Missing fields fall back to the default; a document
/// whose fields cannot be decoded yields `None` (callers keep prior state).
pub fn merge_over_default<T>(fields: &Map<String, Value>) -> Option<T>
where
    T: Default + Serialize + serde::de::DeserializeOwned,
{
    let mut base = match serde_json::to_value(T::default()) {
        Ok(Value::Object(map)) => map,
        _ => return None,
    };
    for (key, value) in fields {
        if key != "id" {
            base.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(Value::Object(base)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_reconcile_appends_missing_defaults_in_default_order() {
        let persisted = vec!["hero".to_string(), "faq".to_string()];
        let default = ["hero", "ticker", "faq", "cells"];
        assert_eq!(
            reconcile_section_order(&persisted, &default),
            vec!["hero", "faq", "ticker", "cells"]
        );
    }

    #[test]
    fn test_reconcile_empty_persisted_yields_default() {
        let effective = reconcile_section_order(&[], DEFAULT_SECTION_ORDER);
        let default: Vec<String> = DEFAULT_SECTION_ORDER
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(effective, default);
    }

    #[test]
    fn test_reconcile_keeps_unknown_persisted_keys() {
        let persisted = vec!["custom".to_string(), "news".to_string()];
        let effective = reconcile_section_order(&persisted, &["news", "prayer"]);
        assert_eq!(effective, vec!["custom", "news", "prayer"]);
    }

    #[test]
    fn test_merge_over_default_missing_fields_fall_back() {
        let doc = fields(json!({ "title": "Our Story" }));
        let about: AboutData = merge_over_default(&doc).unwrap();
        assert_eq!(about.title, "Our Story");
        // Untouched fields keep the hardcoded default.
        assert_eq!(about.mission, AboutData::default().mission);
    }

    #[test]
    fn test_merge_over_default_bad_shape_yields_none() {
        let doc = fields(json!({ "sectionOrder": "not-a-list" }));
        assert!(merge_over_default::<HomeConfig>(&doc).is_none());
    }

    #[test]
    fn test_effective_sections_from_partial_config() {
        let doc = fields(json!({ "sectionOrder": ["news", "hero"] }));
        let home: HomeConfig = merge_over_default(&doc).unwrap();
        let effective = home.effective_sections();
        assert_eq!(effective[0], "news");
        assert_eq!(effective[1], "hero");
        // The remaining defaults follow in their default relative order.
        assert_eq!(
            &effective[2..],
            &["verse", "sermons", "events", "ministries", "prayer"]
        );
    }
}
