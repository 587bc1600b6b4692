//! Local state reconciliation over store snapshots.
//!
//! A [`CollectionMirror`] keeps a live local copy of one collection,
//! replaced wholesale on every pushed snapshot. [`SettingsState`] sits on
//! top of the shared "settings" collection and routes its documents to the
//! typed configuration objects they represent.

mod mirror;
mod settings;

pub use mirror::{CollectionMirror, ListenerState};
pub use settings::{SettingsState, SETTINGS_COLLECTION};
