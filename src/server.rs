//! HTTP API server.
//!
//! Exposes the assistant backend as a JSON API for the web frontend.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Running banner |
//! | `POST` | `/api/chat` | Chat in general or personalized mode |
//! | `POST` | `/api/upload` | Multipart file upload + ingestion |
//! | `POST` | `/api/portfolio-links` | Add a portfolio link + ingestion |
//! | `GET`  | `/api/user-data` | Full user-data record |
//! | `DELETE` | `/api/files/{filename}` | Remove a stored file entry |
//! | `DELETE` | `/api/portfolio-links/{id}` | Remove a stored link |
//! | `GET`  | `/api/health` | Readiness payload |
//!
//! # Error Contract
//!
//! Validation failures return 400, everything else 500, with a body of
//! `{ "error": "<message>" }`. There are no structured error codes, and
//! internal error messages pass through to the caller — the frontend
//! depends on this shape; hiding internals is a known hardening gap.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the frontend is
//! served from a different origin in every deployment this backs.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::ingest::{self, UploadError};
use crate::models::UserData;
use crate::responder::{ChatMode, Responder};
use crate::store::UserDataStore;

/// Shared application state. Every dependency is constructed once at
/// startup and injected here; no module-level singletons.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<UserDataStore>,
    pub responder: Arc<Responder>,
}

/// Start the HTTP server on the configured bind address.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let store = Arc::new(UserDataStore::open(&config.storage)?);
    let responder = Arc::new(Responder::new(&config.completion)?);
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        responder,
    };

    let app = router(state);

    println!("Insightmate API listening on http://{}", bind_addr);
    tracing::info!(bind = %bind_addr, "server started");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router. Split out from [`run_server`] so tests can drive it
/// in-process.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Body limit sits above the upload cap so our own size check is what
    // rejects oversized-but-plausible uploads.
    let upload_body_limit =
        DefaultBodyLimit::max(state.config.storage.max_upload_bytes as usize + 1024 * 1024);

    Router::new()
        .route("/", get(handle_root))
        .route("/api/chat", post(handle_chat))
        .route("/api/upload", post(handle_upload).layer(upload_body_limit))
        .route("/api/portfolio-links", post(handle_add_portfolio_link))
        .route("/api/user-data", get(handle_user_data))
        .route("/api/files/{filename}", delete(handle_delete_file))
        .route("/api/portfolio-links/{id}", delete(handle_delete_portfolio_link))
        .route("/api/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// Error that renders as `{ "error": message }` with its status.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(error = %e, "request failed");
        internal(e.to_string())
    }
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        if e.is_validation() {
            bad_request(e.to_string())
        } else {
            internal(e.to_string())
        }
    }
}

// ============ GET / ============

async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Insightmate API is running!" }))
}

// ============ POST /api/chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default = "default_mode")]
    mode: String,
}

fn default_mode() -> String {
    "general".to_string()
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    mode: String,
    timestamp: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let mode = ChatMode::parse(&request.mode);

    let response = match mode {
        ChatMode::General => state.responder.respond(&request.message, mode, None).await,
        ChatMode::Personalized => {
            let user_data = state.store.get_user_data().await?;
            state
                .responder
                .respond(&request.message, mode, Some(&user_data))
                .await
        }
    };

    Ok(Json(ChatResponse {
        response,
        mode: mode.as_str().to_string(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

// ============ POST /api/upload ============

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    filename: String,
    file_path: String,
}

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Failed to read multipart data: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(|s| s.to_string())
                .ok_or_else(|| bad_request("File field is missing a filename"))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Failed to read file data: {}", e)))?;
            upload = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| bad_request("File is required"))?;

    let storage_path = ingest::save_upload(&state.config.storage, &filename, &bytes)?;
    let content = ingest::process_file(&storage_path);
    state.store.add_file_data(&filename, content).await?;

    tracing::info!(filename = %filename, stored = %storage_path.display(), "file ingested");

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        filename,
        file_path: storage_path.display().to_string(),
    }))
}

// ============ POST /api/portfolio-links ============

#[derive(Deserialize)]
struct PortfolioLinkRequest {
    url: String,
    #[serde(rename = "type")]
    link_type: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Serialize)]
struct PortfolioLinkResponse {
    message: String,
    url: String,
    #[serde(rename = "type")]
    link_type: String,
}

async fn handle_add_portfolio_link(
    State(state): State<AppState>,
    Json(request): Json<PortfolioLinkRequest>,
) -> Result<Json<PortfolioLinkResponse>, AppError> {
    let content = ingest::ingest_link(&request.url).await;
    state
        .store
        .add_portfolio_link(&request.url, &request.link_type, request.description, content)
        .await?;

    tracing::info!(url = %request.url, link_type = %request.link_type, "portfolio link ingested");

    Ok(Json(PortfolioLinkResponse {
        message: "Portfolio link added successfully".to_string(),
        url: request.url,
        link_type: request.link_type,
    }))
}

// ============ GET /api/user-data ============

async fn handle_user_data(State(state): State<AppState>) -> Result<Json<UserData>, AppError> {
    Ok(Json(state.store.get_user_data().await?))
}

// ============ DELETE /api/files/{filename} ============

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn handle_delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.delete_file(&filename).await?;
    Ok(Json(MessageResponse {
        message: format!("File {} deleted successfully", filename),
    }))
}

// ============ DELETE /api/portfolio-links/{id} ============

async fn handle_delete_portfolio_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.delete_portfolio_link(&id).await?;
    Ok(Json(MessageResponse {
        message: "Portfolio link deleted successfully".to_string(),
    }))
}

// ============ GET /api/health ============

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "services": {
            "responder": "active",
            "ingest": "active",
            "store": "active",
        }
    }))
}
