//! HTTP surface: `POST /upload` and `GET /health`.
//!
//! The handler reads the multipart `file` field, hands the bytes to
//! [`IngestionPipeline::ingest`] and maps the outcome onto the wire contract:
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | success | 200 | `{"flags": ...}` |
//! | non-PDF filename | 400 | `{"detail": "Only PDF files are supported."}` |
//! | pipeline failure | 500 | `{"detail": ...}` |
//! | no `file` field | 422 | `{"detail": "Field required"}` |
//! | malformed multipart | 400 | `{"detail": ...}` |
//! | body over the upload limit | 413 | `{"detail": ...}` |

use crate::error::IngestError;
use crate::ingest::IngestionPipeline;
use crate::output::AnalysisResponse;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "file";

/// Default request body limit for uploads: 20 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<IngestionPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<IngestionPipeline>) -> Self {
        Self { pipeline }
    }
}

/// Failure of the `/upload` handler.
#[derive(Debug)]
pub enum ApiError {
    /// The pipeline rejected or failed the upload.
    Ingest(IngestError),
    /// The multipart body could not be read; carries axum's status for it.
    Multipart(StatusCode, String),
    /// No `file` field in the form.
    MissingFile,
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        ApiError::Ingest(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Ingest(e) => (
                StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                e.detail(),
            ),
            ApiError::Multipart(status, msg) => (*status, msg.clone()),
            ApiError::MissingFile => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Field required".to_string(),
            ),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Build the application router.
pub fn router(pipeline: Arc<IngestionPipeline>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(AppState::new(pipeline))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(
    addr: SocketAddr,
    pipeline: Arc<IngestionPipeline>,
    max_upload_bytes: usize,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(pipeline, max_upload_bytes)).await
}

async fn health() -> &'static str {
    "OK"
}

/// POST /upload: analyse one contract.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Failed to read multipart field: {}", e);
        ApiError::Multipart(e.status(), e.body_text())
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            warn!("Failed to read upload '{}': {}", filename, e);
            ApiError::Multipart(e.status(), e.body_text())
        })?;

        let submission = state.pipeline.ingest(&filename, data.to_vec()).await?;
        return Ok(Json(AnalysisResponse {
            flags: submission.flags,
        }));
    }

    warn!("Upload without a '{}' field", UPLOAD_FIELD);
    Err(ApiError::MissingFile)
}
