use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the floor fetch scheduler is still accepting work.
    pub fetcher_running: bool,
}

/// GET /health -- returns service and fetch scheduler health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let fetcher_running = !state.fetcher.is_stopped();
    let status = if fetcher_running { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        fetcher_running,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
