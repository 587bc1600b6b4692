//! Live local mirror of a single collection.

use std::sync::{Arc, RwLock};

use crate::store::{Document, DocumentStore, Subscription};

/// Lifecycle of a collection listener. DETACHED is terminal; reattaching
/// requires a fresh mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Unattached,
    Attached,
    Detached,
}

/// Holds the latest full snapshot of one collection.
///
/// The snapshot is replaced wholesale on every push; the mirror never
/// applies diffs. Dropping the mirror detaches the underlying listener, so
/// a view that owns its mirrors releases every listener on teardown.
pub struct CollectionMirror {
    collection: String,
    items: Arc<RwLock<Vec<Document>>>,
    subscription: Option<Subscription>,
    state: ListenerState,
}

impl CollectionMirror {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            items: Arc::new(RwLock::new(Vec::new())),
            subscription: None,
            state: ListenerState::Unattached,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Starts mirroring. Only valid from UNATTACHED; attaching an already
    /// attached or detached mirror is ignored.
    pub fn attach<S: DocumentStore>(&mut self, store: &S) {
        if self.state != ListenerState::Unattached {
            tracing::warn!(
                collection = %self.collection,
                state = ?self.state,
                "ignoring attach on a non-fresh mirror"
            );
            return;
        }

        let items = self.items.clone();
        let subscription = store.subscribe(
            &self.collection,
            Box::new(move |snapshot| {
                *items.write().expect("mirror lock poisoned") = snapshot;
            }),
        );

        self.subscription = Some(subscription);
        self.state = ListenerState::Attached;
    }

    /// Stops mirroring. The last received snapshot stays readable.
    pub fn detach(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.detach();
        }
        if self.state == ListenerState::Attached {
            self.state = ListenerState::Detached;
        }
    }

    /// The latest snapshot (empty until the first delivery).
    pub fn snapshot(&self) -> Vec<Document> {
        self.items.read().expect("mirror lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().expect("mirror lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for CollectionMirror {
    fn drop(&mut self) {
        self.detach();
    }
}
