//! Health check endpoints.

use attendance_store::health::check_connection;
use axum::{extract::State, http::StatusCode, Json};
use telemetry::{health, metrics};

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health - Full health check.
///
/// Probes the store on every call so the report is current.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    if check_connection(state.store.as_ref()).await {
        health().store.set_healthy();
    } else {
        health().store.set_unhealthy("store ping failed");
    }

    let report = health().report();

    Json(HealthResponse {
        status: report.status,
        store_connected: health().store.is_healthy(),
        rotation_healthy: health().rotation.is_healthy(),
        active_sessions: metrics().active_sessions.get(),
        active_rotations: metrics().active_rotations.get(),
        scans_accepted: metrics().scans_accepted.get(),
    })
}

/// GET /health/ready - Readiness probe (can accept traffic).
pub async fn ready_handler() -> StatusCode {
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
