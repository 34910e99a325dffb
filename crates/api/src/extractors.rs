//! Request extractors.

use attendance_core::{schema::validate_faculty_id, Error};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

use crate::response::ApiError;

/// Header carrying the faculty identity set by the gateway.
pub const FACULTY_HEADER: &str = "X-Faculty-Id";

/// Faculty identity for faculty-only routes.
///
/// The gateway has already authenticated the caller; this only checks that
/// the header is present and well formed.
#[derive(Debug, Clone)]
pub struct FacultyContext {
    pub faculty_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for FacultyContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let faculty_id = parts
            .headers
            .get(FACULTY_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .ok_or_else(|| Error::missing_field(FACULTY_HEADER))?;

        validate_faculty_id(faculty_id)?;

        Ok(FacultyContext {
            faculty_id: faculty_id.to_string(),
        })
    }
}

/// `:session_id` path segment, rejected with `VALID_001` if not a UUID.
#[derive(Debug, Clone, Copy)]
pub struct SessionPath(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for SessionPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("invalid session id: {}", e)))?;
        Ok(SessionPath(id))
    }
}

/// Client IP address.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // First hop of X-Forwarded-For wins.
        if let Some(xff) = parts.headers.get("X-Forwarded-For") {
            if let Ok(xff_str) = xff.to_str() {
                if let Some(ip) = xff_str.split(',').next().map(str::trim) {
                    if !ip.is_empty() {
                        return Ok(ClientIp(Some(ip.to_string())));
                    }
                }
            }
        }

        if let Some(real_ip) = parts.headers.get("X-Real-IP") {
            if let Ok(ip) = real_ip.to_str() {
                return Ok(ClientIp(Some(ip.trim().to_string())));
            }
        }

        Ok(ClientIp(None))
    }
}
