//! File storage boundary: upload a blob under a path prefix, get back a
//! publicly fetchable URL; delete by URL, best effort.
//!
//! File lifecycle is independent of documents. Deleting a document that
//! references a file does not remove the file unless the delete routine
//! targets storage explicitly (see `store::ops::delete_document`).

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use uuid::Uuid;

/// Errors from file storage operations.
#[derive(Debug)]
pub enum FileStoreError {
    Io(String),
    /// The URL does not point into this store.
    ForeignUrl(String),
    /// The URL points into this store but names an unusable object path.
    InvalidObject(String),
    Http(String),
}

impl std::fmt::Display for FileStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStoreError::Io(e) => write!(f, "File I/O error: {}", e),
            FileStoreError::ForeignUrl(url) => {
                write!(f, "URL does not belong to this store: {}", url)
            }
            FileStoreError::InvalidObject(path) => write!(f, "Invalid object path: {}", path),
            FileStoreError::Http(e) => write!(f, "Request failed: {}", e),
        }
    }
}

impl std::error::Error for FileStoreError {}

/// Storage contract: upload returns a public URL, delete is by URL and best
/// effort, `owns_url` is the host-pattern check callers use before
/// attempting a delete at all.
pub trait FileStore {
    fn upload(
        &self,
        bytes: Vec<u8>,
        prefix: &str,
        filename: &str,
    ) -> impl Future<Output = Result<String, FileStoreError>> + Send;

    fn delete(&self, url: &str) -> impl Future<Output = Result<(), FileStoreError>> + Send;

    fn owns_url(&self, url: &str) -> bool;
}

/// Stores objects under a directory on the server host; download URLs are
/// `{public_base}/files/{url-encoded object path}`, served by the server's
/// `/files/` route.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    public_base: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        let public_base = public_base.into();
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    fn url_prefix(&self) -> String {
        format!("{}/files/", self.public_base)
    }

    /// Extracts and validates the object path from a download URL.
    pub fn object_path(&self, url: &str) -> Result<String, FileStoreError> {
        let encoded = url
            .strip_prefix(&self.url_prefix())
            .ok_or_else(|| FileStoreError::ForeignUrl(url.to_string()))?;
        // Strip any download token style query string.
        let encoded = encoded.split('?').next().unwrap_or(encoded);

        let object = urlencoding::decode(encoded)
            .map_err(|_| FileStoreError::InvalidObject(encoded.to_string()))?
            .into_owned();

        if object.is_empty()
            || object.split('/').any(|part| {
                part.is_empty() || part == "." || part == ".." || part.contains('\\')
            })
        {
            return Err(FileStoreError::InvalidObject(object));
        }
        Ok(object)
    }

    /// Absolute path on disk for an object, for the server's serve route.
    pub fn disk_path(&self, object: &str) -> PathBuf {
        self.root.join(object)
    }
}

fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        cleaned
    }
}

impl FileStore for LocalFileStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        prefix: &str,
        filename: &str,
    ) -> Result<String, FileStoreError> {
        // Unique object name so re-uploads never clobber earlier files.
        let object = format!(
            "{}/{}_{}",
            sanitize_component(prefix),
            Uuid::new_v4().simple(),
            sanitize_component(filename)
        );
        let path = self.root.join(&object);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FileStoreError::Io(e.to_string()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| FileStoreError::Io(e.to_string()))?;

        Ok(format!(
            "{}{}",
            self.url_prefix(),
            urlencoding::encode(&object)
        ))
    }

    async fn delete(&self, url: &str) -> Result<(), FileStoreError> {
        let object = self.object_path(url)?;
        let path = self.root.join(&object);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone counts as deleted.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FileStoreError::Io(format!("{}: {}", path.display(), e))),
        }
    }

    fn owns_url(&self, url: &str) -> bool {
        url.starts_with(&self.url_prefix())
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

/// Storage client talking to a chapel-server's file routes.
#[derive(Debug, Clone)]
pub struct RemoteFileStore {
    server_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl RemoteFileStore {
    pub fn new(server_url: impl Into<String>, api_key: Option<String>) -> Self {
        let server_url: String = server_url.into();
        let server_url = server_url.trim_end_matches('/').to_string();
        let server_url = if server_url.starts_with("http://") || server_url.starts_with("https://")
        {
            server_url
        } else {
            format!("http://{}", server_url)
        };
        Self {
            server_url,
            api_key,
            http: reqwest::Client::new(),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }
}

impl FileStore for RemoteFileStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        prefix: &str,
        filename: &str,
    ) -> Result<String, FileStoreError> {
        let url = format!("{}/files/{}/{}", self.server_url, prefix, filename);
        let response = self
            .authorize(self.http.post(&url))
            .body(bytes)
            .send()
            .await
            .map_err(|e| FileStoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FileStoreError::Http(format!(
                "upload returned status {}",
                response.status()
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| FileStoreError::Http(e.to_string()))?;
        Ok(uploaded.url)
    }

    async fn delete(&self, url: &str) -> Result<(), FileStoreError> {
        if !self.owns_url(url) {
            return Err(FileStoreError::ForeignUrl(url.to_string()));
        }
        let endpoint = format!(
            "{}/files?url={}",
            self.server_url,
            urlencoding::encode(url)
        );
        let response = self
            .authorize(self.http.delete(&endpoint))
            .send()
            .await
            .map_err(|e| FileStoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FileStoreError::Http(format!(
                "delete returned status {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn owns_url(&self, url: &str) -> bool {
        url.starts_with(&format!("{}/files/", self.server_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upload_then_delete_round_trip() {
        let dir = tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "http://localhost:8080");

        let url = store
            .upload(b"image-bytes".to_vec(), "frames", "easter.png")
            .await
            .unwrap();
        assert!(store.owns_url(&url));

        let object = store.object_path(&url).unwrap();
        assert!(store.disk_path(&object).exists());

        store.delete(&url).await.unwrap();
        assert!(!store.disk_path(&object).exists());
        // Deleting again is best-effort safe.
        store.delete(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_sanitizes_hostile_names() {
        let dir = tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "http://localhost:8080");

        let url = store
            .upload(b"x".to_vec(), "../etc", "pass/wd.png")
            .await
            .unwrap();
        let object = store.object_path(&url).unwrap();
        assert!(object.split('/').all(|part| part != ".."));
        assert!(store.disk_path(&object).starts_with(dir.path()));
    }

    #[test]
    fn test_foreign_url_rejected() {
        let store = LocalFileStore::new("/tmp/does-not-matter", "http://localhost:8080");
        let err = store
            .object_path("https://elsewhere.example.com/files/x.png")
            .unwrap_err();
        assert!(matches!(err, FileStoreError::ForeignUrl(_)));
        assert!(!store.owns_url("https://elsewhere.example.com/files/x.png"));
    }

    #[test]
    fn test_object_path_rejects_traversal() {
        let store = LocalFileStore::new("/tmp/does-not-matter", "http://localhost:8080");
        let url = format!(
            "http://localhost:8080/files/{}",
            urlencoding::encode("frames/../../etc/passwd")
        );
        assert!(matches!(
            store.object_path(&url),
            Err(FileStoreError::InvalidObject(_))
        ));
    }

    #[test]
    fn test_object_path_ignores_query_string() {
        let store = LocalFileStore::new("/tmp/does-not-matter", "http://localhost:8080");
        let url = format!(
            "http://localhost:8080/files/{}?token=abc",
            urlencoding::encode("frames/easter.png")
        );
        assert_eq!(store.object_path(&url).unwrap(), "frames/easter.png");
    }
}
