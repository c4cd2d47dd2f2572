//! Health check endpoints.

use super::state::AppState;
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Liveness check; does not touch dependencies.
///
/// ```bash
/// curl http://localhost:5000/health
/// # {"status":"ok","version":"0.1.0"}
/// ```
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,
    /// Storage connectivity
    pub database: bool,
    /// Admission store is not backlogged
    pub admission: bool,
}

/// Readiness check: pings storage.
///
/// `503` when the store cannot serve queries.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let database = match state.repos.health.ping().await {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(error = %error, "Readiness check: storage unavailable");
            false
        },
    };
    let admission = state.admission.pending_effects() < ADMISSION_BACKLOG_LIMIT;
    let ready = database && admission;

    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(ReadinessResponse { ready, database, admission }))
}

/// Admission effects beyond which the instance reports itself busy.
const ADMISSION_BACKLOG_LIMIT: usize = 10_000;

/// Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            "metrics exporter not installed".to_string(),
        ),
    }
}
