use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::config::FeedbackBackend;
use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// `file` or `postgres`.
    pub backend: &'static str,
    /// Whether the database is reachable; absent on the file backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_healthy: Option<bool>,
}

/// GET /health -- returns service and database health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match &state.pool {
        Some(pool) => Some(fonteval_db::health_check(pool).await.is_ok()),
        None => None,
    };

    let status = if db_healthy == Some(false) {
        "degraded"
    } else {
        "ok"
    };
    let backend = match state.config.backend {
        FeedbackBackend::File => "file",
        FeedbackBackend::Postgres => "postgres",
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        backend,
        db_healthy,
    })
}

/// Mount health check routes (root level, not under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
