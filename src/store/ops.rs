//! Write path shared by the CLI and any other admin surface.
//!
//! Deletes are gated behind a confirmation policy and may target an
//! associated stored file first; file deletion is best effort and never
//! blocks the document delete.

use serde_json::{Map, Value};

use crate::filestore::FileStore;

use super::{DocumentStore, StoreError};

/// Saves a document. With an id this is a partial merge (creating the
/// document if absent); without one the backend generates an id and stamps
/// `createdAt`. Returns the id of the saved document.
pub async fn save_document<S: DocumentStore>(
    store: &S,
    collection: &str,
    data: Map<String, Value>,
    id: Option<&str>,
) -> Result<String, StoreError> {
    store.save(collection, data, id).await
}

/// Deletes a document behind a confirmation gate.
///
/// If the policy declines, nothing happens and `Ok(false)` is returned. If
/// an associated file URL is supplied and the file store recognizes it as
/// its own, the file is deleted first, best effort: a failure there is
/// logged and swallowed. Returns whether the document deletion completed.
/// Deleting an already-gone id still reports success.
pub async fn delete_document<S, F>(
    store: &S,
    files: Option<&F>,
    confirm: impl FnOnce(&str) -> bool,
    collection: &str,
    id: &str,
    file_url: Option<&str>,
) -> Result<bool, StoreError>
where
    S: DocumentStore,
    F: FileStore,
{
    let prompt = format!("Delete document '{}' from '{}'?", id, collection);
    if !confirm(&prompt) {
        return Ok(false);
    }

    if let (Some(files), Some(url)) = (files, file_url) {
        if files.owns_url(url) {
            if let Err(e) = files.delete(url).await {
                tracing::warn!(
                    collection = %collection,
                    id = %id,
                    "associated file not deleted: {}",
                    e
                );
            }
        } else {
            tracing::debug!(url = %url, "skipping file outside our storage host");
        }
    }

    store.delete(collection, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filestore::LocalFileStore;
    use crate::store::MemoryStore;
    use serde_json::json;
    use tempfile::tempdir;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_declined_confirmation_leaves_document() {
        let store = MemoryStore::new();
        store
            .save("news", fields(json!({ "title": "keep me" })), Some("n1"))
            .await
            .unwrap();

        let deleted = delete_document::<_, LocalFileStore>(
            &store, None, |_| false, "news", "n1", None,
        )
        .await
        .unwrap();

        assert!(!deleted);
        assert_eq!(store.list("news").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_document() {
        let store = MemoryStore::new();
        store
            .save("news", fields(json!({ "title": "going" })), Some("n1"))
            .await
            .unwrap();

        let deleted = delete_document::<_, LocalFileStore>(
            &store, None, |_| true, "news", "n1", None,
        )
        .await
        .unwrap();

        assert!(deleted);
        assert!(store.list("news").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_associated_file_removed_with_document() {
        let dir = tempdir().unwrap();
        let files = LocalFileStore::new(dir.path(), "http://localhost:8080");
        let url = files
            .upload(b"pic".to_vec(), "news", "pic.jpg")
            .await
            .unwrap();
        let object = files.object_path(&url).unwrap();

        let store = MemoryStore::new();
        store
            .save("news", fields(json!({ "imageUrl": url })), Some("n1"))
            .await
            .unwrap();

        let deleted = delete_document(
            &store,
            Some(&files),
            |_| true,
            "news",
            "n1",
            Some(url.as_str()),
        )
        .await
        .unwrap();

        assert!(deleted);
        assert!(!files.disk_path(&object).exists());
    }

    #[tokio::test]
    async fn test_foreign_file_url_is_ignored_but_delete_proceeds() {
        let dir = tempdir().unwrap();
        let files = LocalFileStore::new(dir.path(), "http://localhost:8080");

        let store = MemoryStore::new();
        store
            .save("news", fields(json!({ "title": "x" })), Some("n1"))
            .await
            .unwrap();

        let deleted = delete_document(
            &store,
            Some(&files),
            |_| true,
            "news",
            "n1",
            Some("https://cdn.elsewhere.example/pic.jpg"),
        )
        .await
        .unwrap();

        assert!(deleted);
        assert!(store.list("news").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_delete_failure_does_not_block_document_delete() {
        let dir = tempdir().unwrap();
        let files = LocalFileStore::new(dir.path(), "http://localhost:8080");
        // Owned by the store but decodes to an invalid object path.
        let bad_url = "http://localhost:8080/files/%2e%2e%2Fescape";

        let store = MemoryStore::new();
        store
            .save("news", fields(json!({ "title": "x" })), Some("n1"))
            .await
            .unwrap();

        let deleted = delete_document(
            &store,
            Some(&files),
            |_| true,
            "news",
            "n1",
            Some(bad_url),
        )
        .await
        .unwrap();

        assert!(deleted);
    }
}
