//! Document store: named collections of schemaless documents with
//! push-based full-snapshot subscriptions.
//!
//! Two backends implement the same contract: [`MemoryStore`] (in-process
//! engine, also what the server runs on and what tests inject as a fake
//! client) and [`RemoteStore`] (WebSocket snapshots plus HTTP writes against
//! a chapel-server).

mod document;
mod memory;
mod ops;
mod remote;

pub use document::{auto_id, now_millis, Document, CREATED_AT_FIELD};
pub use memory::MemoryStore;
pub use ops::{delete_document, save_document};
pub use remote::RemoteStore;

use std::future::Future;

use serde_json::{Map, Value};
use tokio::task::JoinHandle;

/// Callback receiving the full current set of documents in a collection.
///
/// The callback contract is full replacement: every invocation carries the
/// entire collection, never a diff.
pub type SnapshotFn = Box<dyn Fn(Vec<Document>) + Send + Sync + 'static>;

/// Errors from store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Could not reach the backend.
    Connection(String),
    /// The backend rejected the request.
    Http(String),
    /// The backend sent something we could not decode.
    Decode(String),
    /// The collection name is empty or otherwise unusable.
    InvalidCollection(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Connection(e) => write!(f, "Connection error: {}", e),
            StoreError::Http(e) => write!(f, "Request failed: {}", e),
            StoreError::Decode(e) => write!(f, "Failed to decode response: {}", e),
            StoreError::InvalidCollection(name) => {
                write!(f, "Invalid collection name: '{}'", name)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Handle to a live snapshot listener.
///
/// Detaching stops further callback invocations and releases the listener.
/// The handle is terminal once detached; resubscribing requires a fresh
/// `subscribe` call. Dropping the handle detaches it, so holding all
/// subscriptions for the lifetime of a view and dropping them together on
/// teardown is enough to avoid leaked listeners.
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
    detached: bool,
}

impl Subscription {
    /// Wraps the forwarding task behind an active listener.
    pub(crate) fn attached(task: JoinHandle<()>) -> Self {
        Self {
            task: Some(task),
            detached: false,
        }
    }

    /// A subscription that never delivers anything. Returned when the
    /// backend connection cannot be established, so consumers degrade to
    /// their default state instead of erroring.
    pub fn noop() -> Self {
        Self {
            task: None,
            detached: false,
        }
    }

    /// Stops the listener. Idempotent; safe to call on a no-op handle.
    pub fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.detached = true;
    }

    /// Whether `detach` has been called.
    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

/// The store contract every backend implements.
///
/// `subscribe` delivers the current snapshot immediately on registration and
/// again after every mutation of the collection. `save` with an id performs
/// a partial merge (creating the document if absent); without an id it
/// creates a new document with a generated identifier and a `createdAt`
/// timestamp. `delete` of an already-absent id is a no-op that still
/// reports success.
pub trait DocumentStore {
    fn subscribe(&self, collection: &str, on_snapshot: SnapshotFn) -> Subscription;

    fn save(
        &self,
        collection: &str,
        data: Map<String, Value>,
        id: Option<&str>,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    fn delete(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// One-shot read of the current snapshot.
    fn list(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;
}
