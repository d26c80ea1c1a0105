//! Route handlers.

use axum::Json;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::dto::{TranscribeBody, TranscribeResponse};
use crate::error::ApiError;
use crate::server::AppState;

/// `POST /transcribe`. Downstream failures come back as 200 with
/// `status: "failed"`; only a malformed reference is a 400.
#[instrument(skip_all)]
pub async fn transcribe(
    State(state): State<AppState>,
    Json(body): Json<TranscribeBody>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    info!(video = %body.video_url, "transcription requested");
    let result = state.orchestrator.transcribe(body.into_request()).await?;
    info!(
        source = result.source.as_str(),
        status = result.status.as_str(),
        "transcription finished"
    );
    Ok(Json(TranscribeResponse::from(&result)))
}

/// `GET /health`.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /metrics` in Prometheus text format.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            tubescribe_telemetry::metrics::render(handle),
        )
            .into_response(),
        None => ApiError::NotFound("metrics are disabled".into()).into_response(),
    }
}
