//! HTTP head over the orchestrator.
//!
//! Routes:
//! - `POST /api/collections/generate`: synchronous, returns the outcome
//! - `POST /api/collections/generate/stream`: one JSON event per line
//! - `GET  /health`
//!
//! Both generate routes call the same orchestrator; the streaming route
//! only frames events as NDJSON.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::Serialize;
use serde_json::json;
use tokio::signal;
use tracing::{error, info, warn};

use crate::orchestrator::{
    GenerationError, GenerationFailure, GenerationOrchestrator, GenerationOutcome, GenerationRequest,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    orchestrator: GenerationOrchestrator,
}

/// Error wrapper so handlers can return `GenerationFailure` directly
pub struct ApiError(GenerationFailure);

impl From<GenerationFailure> for ApiError {
    fn from(failure: GenerationFailure) -> Self {
        Self(failure)
    }
}

/// Error body: the failure plus whatever was accepted before it
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    kind: &'static str,
    #[serde(flatten)]
    partial: &'a GenerationOutcome,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0.error {
            GenerationError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GenerationError::CollectionNotFound { .. } => StatusCode::NOT_FOUND,
            GenerationError::CorruptLineage(_) => StatusCode::CONFLICT,
            GenerationError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        };

        if status.is_server_error() {
            error!(
                status = %status,
                error = %self.0,
                partial = self.0.partial.total,
                "Generation failed"
            );
        }

        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.0.kind(),
            partial: &self.0.partial,
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(orchestrator: GenerationOrchestrator) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/collections/generate", post(generate))
        .route("/api/collections/generate/stream", post(generate_stream))
        .with_state(AppState { orchestrator })
}

/// Bind and serve until Ctrl+C
pub async fn serve(addr: SocketAddr, orchestrator: GenerationOrchestrator) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    info!("  - POST /api/collections/generate         (synchronous)");
    info!("  - POST /api/collections/generate/stream  (NDJSON events)");

    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT, shutting down"),
        Err(e) => {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerationOutcome>, ApiError> {
    let outcome = state.orchestrator.generate(request).await?;
    Ok(Json(outcome))
}

async fn generate_stream(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Response {
    let lines = state.orchestrator.stream(request).map(|event| {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to encode event: {}", e);
                json!({"type": "error", "message": "failed to encode event", "kind": "upstream_unavailable"})
                    .to_string()
            }
        };
        Ok::<_, Infallible>(format!("{}\n", line))
    });

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/x-ndjson"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(lines),
    )
        .into_response()
}
