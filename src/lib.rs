//! Chapel
//!
//! Content platform for a church community site: schemaless document
//! collections with push-based full-snapshot subscriptions, a confirm-gated
//! write path, typed settings with deterministic defaults, a photo-frame
//! compositor, and AI-assisted devotional text with hardcoded fallbacks.

pub mod admin;
pub mod ai;
pub mod commands;
pub mod compositor;
pub mod config;
pub mod filestore;
pub mod models;
pub mod server;
pub mod store;
pub mod sync;

pub use admin::AdminGate;
pub use config::{Config, ConfigError};
pub use store::{
    delete_document, save_document, Document, DocumentStore, MemoryStore, RemoteStore,
    StoreError, Subscription,
};
pub use sync::{CollectionMirror, ListenerState, SettingsState, SETTINGS_COLLECTION};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
