//! Operational endpoints: health, metrics, dead letters.

use axum::{Json, Router, extract::State, routing::get};
use mailroom_common::MetricsSnapshot;
use mailroom_queue::DeadLetterEntry;
use serde::Serialize;

use crate::{response::ApiResponse, state::AppState};

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
}

/// Report process liveness.
async fn healthz() -> ApiResponse<HealthResponse> {
    ApiResponse::ok(HealthResponse { status: "ok" })
}

/// Current counter values.
async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// List quarantined jobs, oldest first.
async fn dead_letters(State(state): State<AppState>) -> Json<Vec<DeadLetterEntry>> {
    Json(state.dead_letters.entries().await)
}

/// Routes for operations.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/v1/dead-letters", get(dead_letters))
}
