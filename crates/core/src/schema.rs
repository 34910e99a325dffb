//! Request schemas and validation.
//!
//! Everything here runs before a request reaches the engine. Failures are
//! `VALID_*` errors surfaced to the caller verbatim.

use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::attendance::ManualAction;
use crate::error::{Error, Result, ValidationErrorCode};
use crate::limits::{IDENTIFIER_PATTERN, MAX_IDENTIFIER_LEN};
use crate::session::SessionScope;

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(IDENTIFIER_PATTERN).expect("invalid identifier pattern"));

fn validate_identifier(value: &str) -> std::result::Result<(), ValidationError> {
    if IDENTIFIER_REGEX.is_match(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("identifier_charset");
        err.message = Some("may only contain letters, digits, '_', '.', '@' and '-'".into());
        Err(err)
    }
}

/// Student scan submitted from a device.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub session_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub token: String,
    #[validate(length(min = 1, max = 64), custom(function = "validate_identifier"))]
    pub student_id: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

/// Faculty override for one student.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualMarkRequest {
    #[validate(length(min = 1, max = 64), custom(function = "validate_identifier"))]
    pub student_id: String,
    pub action: ManualAction,
}

/// Faculty request to open a session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    #[validate(range(min = 1, max = 12))]
    pub semester: u32,
    #[validate(length(min = 1, max = 64))]
    pub branch: String,
    #[validate(length(min = 1, max = 128))]
    pub subject: String,
    #[serde(default = "default_geofencing")]
    pub geofencing_enabled: bool,
}

fn default_geofencing() -> bool {
    true
}

impl OpenSessionRequest {
    pub fn scope(&self) -> SessionScope {
        SessionScope {
            subject: self.subject.trim().to_string(),
            branch: self.branch.trim().to_string(),
            semester: self.semester,
        }
    }
}

/// Deserializes a JSON request body, mapping failures to `VALID_001`.
pub fn parse_request<T: DeserializeOwned>(raw: &[u8]) -> Result<T> {
    serde_json::from_slice(raw).map_err(|e| Error::validation(format!("invalid request: {}", e)))
}

fn validation_error(errors: ValidationErrors) -> Error {
    let fields = errors.errors();
    let coords = fields.contains_key("latitude") || fields.contains_key("longitude");
    let code = if coords {
        ValidationErrorCode::CoordinateOutOfRange
    } else {
        ValidationErrorCode::InvalidFormat
    };
    Error::validation_code(code, errors.to_string())
}

/// Validates a scan request.
///
/// Coordinates must be supplied as a pair or not at all.
pub fn validate_verify_request(request: &VerifyRequest) -> Result<()> {
    request.validate().map_err(validation_error)?;

    match (request.latitude, request.longitude) {
        (Some(_), None) => Err(Error::missing_field("longitude")),
        (None, Some(_)) => Err(Error::missing_field("latitude")),
        _ => Ok(()),
    }
}

pub fn validate_manual_request(request: &ManualMarkRequest) -> Result<()> {
    request.validate().map_err(validation_error)
}

pub fn validate_open_request(request: &OpenSessionRequest) -> Result<()> {
    request.validate().map_err(validation_error)?;
    if request.branch.trim().is_empty() || request.subject.trim().is_empty() {
        return Err(Error::validation("branch and subject must not be blank"));
    }
    Ok(())
}

/// Validates a faculty identifier supplied by the gateway.
pub fn validate_faculty_id(faculty_id: &str) -> Result<()> {
    if faculty_id.is_empty() {
        return Err(Error::missing_field("faculty id"));
    }
    if faculty_id.chars().count() > MAX_IDENTIFIER_LEN || !IDENTIFIER_REGEX.is_match(faculty_id) {
        return Err(Error::validation("invalid faculty id"));
    }
    Ok(())
}
