//! API routes.

pub mod attendance;
pub mod health;
pub mod sessions;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/sessions", post(sessions::open_session))
        .route("/sessions/:session_id", get(sessions::get_session))
        .route("/sessions/:session_id/end", post(sessions::end_session))
        .route("/sessions/:session_id/qr", get(sessions::current_qr))
        .route("/sessions/:session_id/summary", get(sessions::summary))
        .route(
            "/sessions/:session_id/attendance",
            get(attendance::list_attendance),
        )
        .route(
            "/sessions/:session_id/attendance/manual",
            post(attendance::manual_mark),
        )
        .route("/attendance/verify", post(attendance::verify))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
