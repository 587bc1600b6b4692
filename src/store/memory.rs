//! In-process collection engine.
//!
//! Each collection keeps its documents in insertion order and owns a
//! broadcast channel; every mutation rebuilds the full snapshot and fans it
//! out to all listeners. This is the engine the server runs on, and the
//! fake client tests construct per test case.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tokio::sync::broadcast;

use super::{auto_id, now_millis, Document, DocumentStore, SnapshotFn, StoreError, Subscription};
use super::CREATED_AT_FIELD;

/// Buffer of pending snapshots per listener before it starts lagging.
const CHANNEL_CAPACITY: usize = 16;

struct CollectionState {
    /// Document ids in insertion order. Snapshot ordering is exactly this;
    /// no implicit sort is applied.
    order: Vec<String>,
    docs: HashMap<String, Document>,
    tx: broadcast::Sender<Vec<Document>>,
}

impl CollectionState {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            order: Vec::new(),
            docs: HashMap::new(),
            tx,
        }
    }

    fn snapshot(&self) -> Vec<Document> {
        self.order
            .iter()
            .filter_map(|id| self.docs.get(id).cloned())
            .collect()
    }

    fn broadcast(&self) {
        // Send errors just mean there are no listeners right now.
        let _ = self.tx.send(self.snapshot());
    }
}

/// In-memory document store.
///
/// Cheap to clone; clones share the same collections.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, CollectionState>>>,
}

impl Default for CollectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads documents into a collection without notifying listeners.
    /// Used to rebuild state from persistence at server startup.
    pub fn hydrate(&self, collection: &str, docs: Vec<Document>) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let state = inner.entry(collection.to_string()).or_default();
        for doc in docs {
            if !state.docs.contains_key(&doc.id) {
                state.order.push(doc.id.clone());
            }
            state.docs.insert(doc.id.clone(), doc);
        }
    }

    /// Current state of one document, if present.
    pub fn get(&self, collection: &str, id: &str) -> Option<Document> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.get(collection)?.docs.get(id).cloned()
    }

    /// Names of collections currently holding state.
    pub fn collections(&self) -> Vec<String> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.keys().cloned().collect()
    }

    fn apply_save(
        &self,
        collection: &str,
        data: Map<String, Value>,
        id: Option<&str>,
    ) -> String {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let state = inner.entry(collection.to_string()).or_default();

        let id = match id {
            Some(id) => {
                match state.docs.get_mut(id) {
                    Some(existing) => existing.merge(&data),
                    None => {
                        state.order.push(id.to_string());
                        state.docs.insert(id.to_string(), Document::new(id, data));
                    }
                }
                id.to_string()
            }
            None => {
                let id = auto_id();
                let mut fields = data;
                fields.insert(CREATED_AT_FIELD.to_string(), Value::from(now_millis()));
                state.order.push(id.clone());
                state.docs.insert(id.clone(), Document::new(&id, fields));
                id
            }
        };

        state.broadcast();
        id
    }

    fn apply_delete(&self, collection: &str, id: &str) -> bool {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let state = match inner.get_mut(collection) {
            Some(state) => state,
            // Deleting from a collection that never existed is a no-op.
            None => return true,
        };

        if state.docs.remove(id).is_some() {
            state.order.retain(|existing| existing != id);
            state.broadcast();
        }
        // "Already gone" is not distinguished from "succeeded".
        true
    }
}

impl DocumentStore for MemoryStore {
    fn subscribe(&self, collection: &str, on_snapshot: SnapshotFn) -> Subscription {
        let (mut rx, initial) = {
            let mut inner = self.inner.write().expect("store lock poisoned");
            let state = inner.entry(collection.to_string()).or_default();
            (state.tx.subscribe(), state.snapshot())
        };

        // Initial delivery happens synchronously at registration.
        on_snapshot(initial);

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(snapshot) => on_snapshot(snapshot),
                    // A lagged listener just picks up the next (newer)
                    // snapshot; full replacement makes skips harmless.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Subscription::attached(task)
    }

    async fn save(
        &self,
        collection: &str,
        data: Map<String, Value>,
        id: Option<&str>,
    ) -> Result<String, StoreError> {
        if collection.is_empty() {
            return Err(StoreError::InvalidCollection(collection.to_string()));
        }
        Ok(self.apply_save(collection, data, id))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        if collection.is_empty() {
            return Err(StoreError::InvalidCollection(collection.to_string()));
        }
        Ok(self.apply_delete(collection, id))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .get(collection)
            .map(|state| state.snapshot())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    /// Collects every snapshot a listener receives.
    fn recorder() -> (SnapshotFn, Arc<Mutex<Vec<Vec<Document>>>>) {
        let seen: Arc<Mutex<Vec<Vec<Document>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: SnapshotFn = Box::new(move |snapshot| {
            sink.lock().unwrap().push(snapshot);
        });
        (callback, seen)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_subscribe_delivers_initial_snapshot() {
        let store = MemoryStore::new();
        store
            .save("news", fields(json!({ "title": "first" })), Some("n1"))
            .await
            .unwrap();

        let (callback, seen) = recorder();
        let _sub = store.subscribe("news", callback);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[0][0].id, "n1");
    }

    #[tokio::test]
    async fn test_write_after_subscribe_pushes_full_snapshot() {
        let store = MemoryStore::new();
        let (callback, seen) = recorder();
        let _sub = store.subscribe("news", callback);

        store
            .save("news", fields(json!({ "title": "a" })), Some("n1"))
            .await
            .unwrap();
        store
            .save("news", fields(json!({ "title": "b" })), Some("n2"))
            .await
            .unwrap();
        settle().await;

        let seen = seen.lock().unwrap();
        // Initial empty snapshot, then one per write, each a full set.
        assert_eq!(seen.len(), 3);
        assert!(seen[0].is_empty());
        assert_eq!(seen[1].len(), 1);
        assert_eq!(seen[2].len(), 2);
        assert_eq!(seen[2][1].get_str("title"), Some("b"));
    }

    #[tokio::test]
    async fn test_save_with_id_merges_partially() {
        let store = MemoryStore::new();
        store
            .save("sermons", fields(json!({ "title": "Grace", "speaker": "A" })), Some("s1"))
            .await
            .unwrap();
        store
            .save("sermons", fields(json!({ "speaker": "B", "series": "Romans" })), Some("s1"))
            .await
            .unwrap();

        let docs = store.list("sermons").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_str("title"), Some("Grace"));
        assert_eq!(docs[0].get_str("speaker"), Some("B"));
        assert_eq!(docs[0].get_str("series"), Some("Romans"));
    }

    #[tokio::test]
    async fn test_save_without_id_generates_id_and_created_at() {
        let store = MemoryStore::new();
        let id = store
            .save("prayers", fields(json!({ "request": "healing" })), None)
            .await
            .unwrap();

        assert_eq!(id.len(), 20);
        let docs = store.list("prayers").await.unwrap();
        assert_eq!(docs[0].id, id);
        assert!(docs[0].created_at().is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_and_is_safe_to_repeat() {
        let store = MemoryStore::new();
        store
            .save("events", fields(json!({ "title": "picnic" })), Some("e1"))
            .await
            .unwrap();

        assert!(store.delete("events", "e1").await.unwrap());
        assert!(store.list("events").await.unwrap().is_empty());
        // Second delete of the same id is a no-op that still succeeds.
        assert!(store.delete("events", "e1").await.unwrap());
        assert!(store.delete("missing", "nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_detach_stops_delivery() {
        let store = MemoryStore::new();
        let (callback, seen) = recorder();
        let mut sub = store.subscribe("news", callback);
        sub.detach();
        assert!(sub.is_detached());

        store
            .save("news", fields(json!({ "title": "late" })), Some("n1"))
            .await
            .unwrap();
        settle().await;

        // Only the initial snapshot arrived.
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_independent_collections_do_not_cross_notify() {
        let store = MemoryStore::new();
        let (callback, seen) = recorder();
        let _sub = store.subscribe("news", callback);

        store
            .save("sermons", fields(json!({ "title": "x" })), Some("s1"))
            .await
            .unwrap();
        settle().await;

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_hydrate_preserves_order_without_notifying() {
        let store = MemoryStore::new();
        let (callback, seen) = recorder();
        let _sub = store.subscribe("news", callback);

        store.hydrate(
            "news",
            vec![
                Document::new("n2", fields(json!({ "title": "b" }))),
                Document::new("n1", fields(json!({ "title": "a" }))),
            ],
        );
        settle().await;

        assert_eq!(seen.lock().unwrap().len(), 1);
        let docs = store.list("news").await.unwrap();
        assert_eq!(docs[0].id, "n2");
        assert_eq!(docs[1].id, "n1");
    }

    #[tokio::test]
    async fn test_empty_collection_name_rejected() {
        let store = MemoryStore::new();
        let err = store.save("", Map::new(), None).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCollection(_)));
    }
}
