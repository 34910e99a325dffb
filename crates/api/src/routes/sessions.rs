//! Faculty session endpoints.

use attendance_core::{
    schema::{parse_request, OpenSessionRequest},
    AttendanceSummary, QrPayload, Session,
};
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use tracing::{info, warn};

use crate::extractors::{FacultyContext, SessionPath};
use crate::response::ApiError;
use crate::state::AppState;

/// POST /sessions - Open a session and start rotating its code.
pub async fn open_session(
    State(state): State<AppState>,
    faculty: FacultyContext,
    body: Bytes,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let request: OpenSessionRequest = parse_request(&body)?;
    let session = state.sessions.open(&faculty.faculty_id, &request).await?;

    state.rotations.start(session.id);

    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /sessions/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(state.sessions.get(session_id).await?))
}

/// POST /sessions/:session_id/end - Deactivate and stop rotation.
pub async fn end_session(
    State(state): State<AppState>,
    faculty: FacultyContext,
    SessionPath(session_id): SessionPath,
) -> Result<Json<Session>, ApiError> {
    let session = state.sessions.end(session_id).await?;

    if !state.rotations.stop(session_id) {
        warn!(session_id = %session_id, "Ended session had no running rotation");
    }
    info!(
        session_id = %session_id,
        ended_by = %faculty.faculty_id,
        "Session closed via API"
    );

    Ok(Json(session))
}

/// GET /sessions/:session_id/qr - Payload for the live QR code.
pub async fn current_qr(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
) -> Result<Json<QrPayload>, ApiError> {
    Ok(Json(state.tokens.current_payload(session_id).await?))
}

/// GET /sessions/:session_id/summary - Live counts.
pub async fn summary(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
) -> Result<Json<AttendanceSummary>, ApiError> {
    Ok(Json(state.attendance.summary(session_id).await?))
}
