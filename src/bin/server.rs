//! Chapel Content Server
//!
//! Holds the site's document collections, persists them to SQLite, and
//! pushes full-snapshot updates to WebSocket subscribers on every mutation.
//! Reads are public, like the site itself; mutations and file management
//! sit behind the shared admin password used as a bearer key.
//!
//! # Configuration
//!
//! Environment variables:
//! - `CHAPEL_PORT`: Port to listen on (default: 8080)
//! - `CHAPEL_DATA_DIR`: Directory for the database and uploaded files
//!   (default: ~/.local/share/chapel-server)
//! - `CHAPEL_PUBLIC_URL`: Public base URL used in file download links
//!   (default: http://localhost:<port>)
//! - `CHAPEL_ADMIN_PASSWORD`: Shared admin password; if unset, every
//!   mutating request is rejected
//!
//! # Endpoints
//!
//! - `GET /health`: Health check (no auth)
//! - `GET /collections/{name}`: Current snapshot of a collection (no auth)
//! - `GET /sync/{name}`: WebSocket pushing full snapshots (no auth)
//! - `GET /files/{object}`: Serve an uploaded file (no auth)
//! - `POST /collections/{name}`: Create or merge a document (auth)
//! - `DELETE /collections/{name}/{id}`: Delete a document (auth)
//! - `POST /files/{prefix}/{filename}`: Upload a file (auth)
//! - `DELETE /files?url=...`: Best-effort file delete (auth)

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket},
        Path, Query, Request, State, WebSocketUpgrade,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chapel::filestore::{FileStore, LocalFileStore};
use chapel::server::{init_db, DocumentRepository};
use chapel::store::{Document, DocumentStore, MemoryStore};
use chapel::AdminGate;

// ============================================================================
// Configuration
// ============================================================================

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    port: u16,
    data_dir: PathBuf,
    public_url: String,
    admin_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("CHAPEL_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("CHAPEL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("chapel-server")
            });

        let public_url = std::env::var("CHAPEL_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        let admin_password = std::env::var("CHAPEL_ADMIN_PASSWORD").ok();

        Self {
            port,
            data_dir,
            public_url,
            admin_password,
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Auth error response
#[derive(Serialize)]
struct AuthError {
    error: &'static str,
    message: &'static str,
}

/// Admin gate middleware for mutating routes
async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let attempt = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        Some(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(AuthError {
                    error: "invalid_auth",
                    message: "Authorization header must use Bearer scheme",
                }),
            )
                .into_response();
        }
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(AuthError {
                    error: "missing_auth",
                    message: "Authorization header required",
                }),
            )
                .into_response();
        }
    };

    if state.gate.check(attempt) {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(AuthError {
                error: "invalid_key",
                message: "Invalid admin password",
            }),
        )
            .into_response()
    }
}

// ============================================================================
// State and handlers
// ============================================================================

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    store: MemoryStore,
    repo: Arc<DocumentRepository>,
    files: LocalFileStore,
    gate: Arc<AdminGate>,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

/// One-shot snapshot of a collection
async fn list_collection(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match state.store.list(&name).await {
        Ok(docs) => Json(docs).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
struct SaveRequest {
    #[serde(default)]
    id: Option<String>,
    data: Map<String, Value>,
}

#[derive(Serialize)]
struct SaveResponse {
    id: String,
}

/// Create or merge a document, writing through to SQLite
async fn save_document(
    Path(name): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> Response {
    let id = match state
        .store
        .save(&name, request.data, request.id.as_deref())
        .await
    {
        Ok(id) => id,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    // Persist the merged result. The live store already broadcast the new
    // snapshot; a persistence failure is logged but does not undo it.
    if let Some(doc) = state.store.get(&name, &id) {
        if let Err(e) = state.repo.upsert(&name, &doc).await {
            tracing::error!(collection = %name, id = %id, "write-through failed: {}", e);
        }
    }

    Json(SaveResponse { id }).into_response()
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
}

/// Delete a document. Deleting an absent id still reports success.
async fn delete_document(
    Path((name, id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Response {
    let deleted = match state.store.delete(&name, &id).await {
        Ok(deleted) => deleted,
        Err(e) => return internal_error(e),
    };

    if let Err(e) = state.repo.delete(&name, &id).await {
        tracing::error!(collection = %name, id = %id, "delete write-through failed: {}", e);
    }

    Json(DeleteResponse { deleted }).into_response()
}

/// WebSocket pushing the full collection snapshot on every mutation
async fn sync_collection(
    Path(name): Path<String>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_sync_socket(socket, state, name))
}

async fn handle_sync_socket(socket: WebSocket, state: AppState, name: String) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Vec<Document>>();

    // The subscription callback hands snapshots to this socket's task; the
    // initial snapshot is delivered synchronously by subscribe itself.
    let subscription = state.store.subscribe(
        &name,
        Box::new(move |snapshot| {
            let _ = tx.send(snapshot);
        }),
    );

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            snapshot = rx.recv() => {
                let Some(snapshot) = snapshot else { break };
                let payload = match serde_json::to_string(&snapshot) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!(collection = %name, "snapshot serialization failed: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            message = receiver.next() => {
                match message {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // Dropping the subscription detaches the listener.
    drop(subscription);
    tracing::debug!(collection = %name, "sync socket closed");
}

#[derive(Serialize)]
struct UploadResponse {
    url: String,
}

/// Upload a file, returning its public URL
async fn upload_file(
    Path((prefix, filename)): Path<(String, String)>,
    State(state): State<AppState>,
    body: Bytes,
) -> Response {
    match state.files.upload(body.to_vec(), &prefix, &filename).await {
        Ok(url) => Json(UploadResponse { url }).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
struct DeleteFileQuery {
    url: String,
}

/// Best-effort delete of an uploaded file by URL
async fn delete_file(
    Query(query): Query<DeleteFileQuery>,
    State(state): State<AppState>,
) -> Response {
    match state.files.delete(&query.url).await {
        Ok(()) => Json(DeleteResponse { deleted: true }).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

fn content_type_for(object: &str) -> &'static str {
    match object.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Serve an uploaded file
async fn serve_file(Path(object): Path<String>, State(state): State<AppState>) -> Response {
    // Reject traversal attempts before touching the filesystem.
    if object
        .split('/')
        .any(|part| part.is_empty() || part == "." || part == ".." || part.contains('\\'))
    {
        return StatusCode::NOT_FOUND.into_response();
    }

    match tokio::fs::read(state.files.disk_path(&object)).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type_for(&object))],
            bytes,
        )
            .into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chapel_server=info,chapel=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    // Ensure data directory exists
    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Public URL: {}", config.public_url);

    let gate = match &config.admin_password {
        Some(password) => AdminGate::new(password.clone()),
        None => {
            tracing::warn!("CHAPEL_ADMIN_PASSWORD not set - all mutating requests will fail");
            AdminGate::new("")
        }
    };

    // Open persistence and hydrate the live store
    let pool = match init_db(Some(config.data_dir.join("chapel.db"))).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };
    let repo = Arc::new(DocumentRepository::new(pool));

    let store = MemoryStore::new();
    match repo.load_all().await {
        Ok(collections) => {
            for (name, docs) in collections {
                tracing::info!("Loaded {} document(s) into '{}'", docs.len(), name);
                store.hydrate(&name, docs);
            }
        }
        Err(e) => {
            tracing::error!("Failed to load persisted documents: {}", e);
            std::process::exit(1);
        }
    }

    let files = LocalFileStore::new(config.data_dir.join("files"), config.public_url.clone());

    // Build app state
    let state = AppState {
        store,
        repo,
        files,
        gate: Arc::new(gate),
    };

    // Public routes (no auth): reads, snapshots, file downloads
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/collections/{name}", get(list_collection))
        .route("/sync/{name}", get(sync_collection))
        .route("/files/{object}", get(serve_file));

    // Protected routes (admin gate): mutations and uploads
    let protected_routes = Router::new()
        .route("/collections/{name}", post(save_document))
        .route("/collections/{name}/{id}", delete(delete_document))
        .route("/files/{prefix}/{filename}", post(upload_file))
        .route("/files", delete(delete_file))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
