//! Attendance endpoints.

use attendance_core::{
    schema::{parse_request, ManualMarkRequest, VerifyRequest},
    AttendanceRecord,
};
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, warn};

use crate::extractors::{ClientIp, FacultyContext, SessionPath};
use crate::middleware::rate_limit::scan_key;
use crate::response::{ApiError, VerifyResponse};
use crate::state::AppState;

/// POST /attendance/verify - Student scan.
///
/// Rate limited per student, separately for each client address.
pub async fn verify(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    body: Bytes,
) -> Result<Json<VerifyResponse>, ApiError> {
    let start = Instant::now();

    let request: VerifyRequest = parse_request(&body).inspect_err(|_| {
        metrics().validation_failures.inc();
    })?;

    let key = scan_key(client_ip.as_deref(), &request.student_id);
    if let Err(e) = state.rate_limiter.check(&key) {
        metrics().rate_limited_requests.inc();
        warn!(client = %key, "Scan rate limited");
        return Err(e.into());
    }

    let record = state.attendance.verify_scan(&request).await?;

    debug!(
        session_id = %record.session_id,
        student_id = %record.student_id,
        latency_ms = start.elapsed().as_millis() as u64,
        "Scan verified"
    );

    Ok(Json(VerifyResponse::marked(record)))
}

/// POST /sessions/:session_id/attendance/manual - Faculty override.
pub async fn manual_mark(
    State(state): State<AppState>,
    faculty: FacultyContext,
    SessionPath(session_id): SessionPath,
    body: Bytes,
) -> Result<(StatusCode, Json<AttendanceRecord>), ApiError> {
    let request: ManualMarkRequest = parse_request(&body)?;
    let record = state
        .attendance
        .manual_mark(session_id, &request, &faculty.faculty_id)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /sessions/:session_id/attendance - Records, oldest first.
pub async fn list_attendance(
    State(state): State<AppState>,
    SessionPath(session_id): SessionPath,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    Ok(Json(state.attendance.records(session_id).await?))
}
