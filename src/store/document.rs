//! Schemaless document type shared by every collection.
//!
//! A document is a string identifier plus an arbitrary map of JSON fields.
//! Snapshots always carry the identifier merged alongside the fields, which
//! is what the `#[serde(flatten)]` layout produces on the wire.

use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field stamped on newly created documents (epoch milliseconds).
pub const CREATED_AT_FIELD: &str = "createdAt";

/// A single record within a collection.
///
/// The identifier, once assigned, never changes. Updates are partial merges
/// over the existing fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique within the owning collection.
    pub id: String,
    /// Schemaless payload. Never contains an `id` key; the identifier lives
    /// in `id` and is flattened next to the fields when serialized.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Creates a document, stripping any `id` key from the field map so the
    /// identifier cannot be shadowed.
    pub fn new(id: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove("id");
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Looks up a string field by name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Looks up an integer field by name.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }

    /// Epoch-millisecond creation timestamp, if the document carries one.
    pub fn created_at(&self) -> Option<i64> {
        self.get_i64(CREATED_AT_FIELD)
    }

    /// Shallow partial merge: every top-level field in `partial` replaces or
    /// adds to the existing fields. Identical input is idempotent.
    pub fn merge(&mut self, partial: &Map<String, Value>) {
        for (key, value) in partial {
            if key == "id" {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }
    }
}

/// Generates a backend-style identifier: 20 random alphanumeric characters.
pub fn auto_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

/// Current time as epoch milliseconds, the format used for `createdAt`.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
