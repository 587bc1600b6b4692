//! Settings disambiguation.
//!
//! Every change to any settings document delivers the full settings
//! snapshot. This layer re-scans that snapshot for each well-known
//! identifier, merges found documents over their hardcoded defaults, and
//! leaves identifiers absent from the snapshot at their prior value.

use crate::models::{
    merge_over_default, AboutData, HomeConfig, TenYearsData, WelcomeData, ABOUT_DATA_ID,
    HOME_CONFIG_ID, TEN_YEARS_DATA_ID, WELCOME_DATA_ID,
};
use crate::store::Document;

/// Name of the shared physical collection.
pub const SETTINGS_COLLECTION: &str = "settings";

/// Decoded view over the settings collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsState {
    pub home: HomeConfig,
    pub welcome: WelcomeData,
    pub about: AboutData,
    pub ten_years: TenYearsData,
}

impl SettingsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a full settings snapshot.
    ///
    /// Each well-known identifier found in the snapshot replaces the
    /// corresponding piece of state with the document merged over the
    /// hardcoded default. Identifiers not present keep their prior value.
    /// Documents that fail to decode also keep the prior value, logged at
    /// warn.
    pub fn apply_snapshot(&mut self, snapshot: &[Document]) {
        for doc in snapshot {
            match doc.id.as_str() {
                HOME_CONFIG_ID => apply(&mut self.home, doc),
                WELCOME_DATA_ID => apply(&mut self.welcome, doc),
                ABOUT_DATA_ID => apply(&mut self.about, doc),
                TEN_YEARS_DATA_ID => apply(&mut self.ten_years, doc),
                other => {
                    tracing::debug!(id = %other, "ignoring unknown settings document");
                }
            }
        }
    }
}

fn apply<T>(slot: &mut T, doc: &Document)
where
    T: Default + serde::Serialize + serde::de::DeserializeOwned,
{
    match merge_over_default(&doc.fields) {
        Some(decoded) => *slot = decoded,
        None => {
            tracing::warn!(id = %doc.id, "settings document failed to decode, keeping prior value");
        }
    }
}
