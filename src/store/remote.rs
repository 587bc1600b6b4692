//! Client backend for a chapel-server.
//!
//! Writes go over HTTP; snapshots arrive over a WebSocket per collection,
//! each frame carrying the full current document set as a JSON array.

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{Document, DocumentStore, SnapshotFn, StoreError, Subscription};

#[derive(Serialize)]
struct SaveRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    data: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct SaveResponse {
    id: String,
}

#[derive(Deserialize)]
struct DeleteResponse {
    deleted: bool,
}

/// Store backend talking to a remote chapel-server.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    server_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl RemoteStore {
    pub fn new(server_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_key,
            http: reqwest::Client::new(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn build_http_url(&self, path: &str) -> String {
        let base = self.server_url.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{}{}", base, path)
        } else {
            format!("http://{}{}", base, path)
        }
    }

    /// Builds the snapshot WebSocket URL for a collection, converting an
    /// http(s) base to ws(s) as needed.
    fn build_ws_url(&self, collection: &str) -> String {
        let base = self.server_url.trim_end_matches('/');
        let base = if base.starts_with("http://") {
            base.replacen("http://", "ws://", 1)
        } else if base.starts_with("https://") {
            base.replacen("https://", "wss://", 1)
        } else if !base.starts_with("ws://") && !base.starts_with("wss://") {
            format!("ws://{}", base)
        } else {
            base.to_string()
        };

        match &self.api_key {
            Some(key) => format!("{}/sync/{}?key={}", base, collection, key),
            None => format!("{}/sync/{}", base, collection),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }
}

impl DocumentStore for RemoteStore {
    /// Opens the snapshot WebSocket in the background. If the connection
    /// cannot be established the callback is never invoked and local state
    /// stays at its default; the failure is logged, not raised.
    fn subscribe(&self, collection: &str, on_snapshot: SnapshotFn) -> Subscription {
        let ws_url = self.build_ws_url(collection);
        let collection = collection.to_string();

        let task = tokio::spawn(async move {
            let (ws_stream, _) = match connect_async(&ws_url).await {
                Ok(connected) => connected,
                Err(e) => {
                    tracing::warn!(
                        collection = %collection,
                        "snapshot subscription unavailable, degrading to defaults: {}",
                        e
                    );
                    return;
                }
            };

            let (mut sender, mut receiver) = ws_stream.split();

            while let Some(message) = receiver.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<Vec<Document>>(text.as_str()) {
                            Ok(snapshot) => on_snapshot(snapshot),
                            Err(e) => {
                                tracing::warn!(
                                    collection = %collection,
                                    "dropping undecodable snapshot: {}",
                                    e
                                );
                            }
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => {}
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

        let url = self.build_http_url(&format!("/collections/{}", collection));
        let body = SaveRequest { id, data: &data };

        let response = self
            .authorize(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Http(format!(
                "save to '{}' returned status {}",
                collection,
                response.status()
            )));
        }

        let saved: SaveResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(saved.id)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let url = self.build_http_url(&format!("/collections/{}/{}", collection, id));

        let response = self
            .authorize(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Http(format!(
                "delete from '{}' returned status {}",
                collection,
                response.status()
            )));
        }

        let outcome: DeleteResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(outcome.deleted)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let url = self.build_http_url(&format!("/collections/{}", collection));

        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Http(format!(
                "list of '{}' returned status {}",
                collection,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}
