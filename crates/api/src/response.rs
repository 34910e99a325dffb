//! Standardized API responses.

use attendance_core::{AttendanceRecord, Error, GeofenceStatus};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use telemetry::HealthStatus;

/// Successful scan.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
    pub geofencing_status: GeofenceStatus,
    pub record: AttendanceRecord,
}

impl VerifyResponse {
    pub fn marked(record: AttendanceRecord) -> Self {
        Self {
            success: true,
            message: "Attendance marked".to_string(),
            geofencing_status: record.geofencing_status,
            record,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub store_connected: bool,
    pub rotation_healthy: bool,
    pub active_sessions: u64,
    pub active_rotations: u64,
    pub scans_accepted: u64,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error carrying a stable error code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
            retry_after: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    pub fn rate_limited(msg: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            response: ErrorResponse::new(msg, "RATE_001"),
            retry_after,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "DB_001", msg)
    }

    pub fn validation(code: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: ErrorResponse::new("Validation failed", code).with_details(errors),
            retry_after: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.response.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        response
    }
}

fn status_of(http_status: u16, fallback: StatusCode) -> StatusCode {
    StatusCode::from_u16(http_status).unwrap_or(fallback)
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation { code, message, .. } => ApiError::validation(code, vec![message]),
            Error::Token {
                code,
                message,
                http_status,
            } => ApiError::with_code(
                status_of(http_status, StatusCode::BAD_REQUEST),
                code,
                message,
            ),
            Error::DuplicateAttendance { .. } => ApiError::with_code(
                StatusCode::CONFLICT,
                attendance_core::error::DUPLICATE_ATTENDANCE_CODE,
                "Attendance already marked",
            ),
            Error::Session {
                code,
                message,
                http_status,
            } => ApiError::with_code(status_of(http_status, StatusCode::NOT_FOUND), code, message),
            // Store internals stay in the log.
            Error::Storage { code, .. } => ApiError::with_code(
                StatusCode::INTERNAL_SERVER_ERROR,
                code,
                "Storage unavailable",
            ),
            Error::RateLimit {
                message,
                retry_after,
                ..
            } => ApiError::rate_limited(message, retry_after),
            Error::Serialization(e) => ApiError::bad_request(e.to_string()),
            Error::Internal(_) => ApiError::internal("Internal error"),
        }
    }
}
