//! Unified error types for the attendance engine.
//!
//! Error codes:
//! - VALID_001-003: Request validation errors
//! - TOKEN_001-002: QR token errors
//! - ATTEND_001: Attendance errors
//! - SESSION_001-002: Session state errors
//! - RATE_001: Rate limit errors
//! - DB_001: Storage errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Malformed request or field format
    InvalidFormat,
    /// VALID_002: Required field missing
    MissingField,
    /// VALID_003: Coordinate outside valid range
    CoordinateOutOfRange,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "VALID_001",
            Self::MissingField => "VALID_002",
            Self::CoordinateOutOfRange => "VALID_003",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// QR token error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenErrorCode {
    /// TOKEN_001: Token not found, issued for another session, or expired
    InvalidOrExpired,
    /// TOKEN_002: Session has no live token to display
    NoLiveToken,
}

impl TokenErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidOrExpired => "TOKEN_001",
            Self::NoLiveToken => "TOKEN_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidOrExpired => 400,
            Self::NoLiveToken => 404,
        }
    }
}

/// Session error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorCode {
    /// SESSION_001: Session does not exist
    NotFound,
    /// SESSION_002: Session has already ended
    Inactive,
}

impl SessionErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "SESSION_001",
            Self::Inactive => "SESSION_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Inactive => 409,
        }
    }
}

/// Storage error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorCode {
    /// DB_001: Storage layer unavailable or write failed
    StoreFailed,
}

impl DbErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreFailed => "DB_001",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        500
    }
}

/// Rate limit error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitErrorCode {
    /// RATE_001: Rate limit exceeded
    Exceeded,
}

impl RateLimitErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Exceeded => "RATE_001",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        429
    }
}

/// Duplicate attendance error code string.
pub const DUPLICATE_ATTENDANCE_CODE: &str = "ATTEND_001";

/// Unified error type for the attendance engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Request failed validation before reaching the core.
    #[error("[{code}] {message}")]
    Validation {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Token absent, scoped to another session, or expired.
    #[error("[{code}] {message}")]
    Token {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Student already has a record for this session.
    #[error("[ATTEND_001] attendance already marked for student {student_id}")]
    DuplicateAttendance { student_id: String },

    /// Session lookup or state transition failed.
    #[error("[{code}] {message}")]
    Session {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Storage layer failure; nothing was committed.
    #[error("[{code}] {message}")]
    Storage {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Rate limit error with code.
    #[error("[{code}] {message}")]
    RateLimit {
        code: &'static str,
        message: String,
        http_status: u16,
        retry_after: Option<u64>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error with code.
    pub fn validation_code(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::Validation {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a malformed-input validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::validation_code(ValidationErrorCode::InvalidFormat, msg)
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::validation_code(
            ValidationErrorCode::MissingField,
            format!("missing required field: {}", field.into()),
        )
    }

    /// Create a token error.
    pub fn token(code: TokenErrorCode, msg: impl Into<String>) -> Self {
        Self::Token {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// The single user-facing rejection for any failed token check.
    pub fn invalid_token() -> Self {
        Self::token(TokenErrorCode::InvalidOrExpired, "Invalid or expired code")
    }

    pub fn duplicate(student_id: impl Into<String>) -> Self {
        Self::DuplicateAttendance {
            student_id: student_id.into(),
        }
    }

    /// Create a session error.
    pub fn session(code: SessionErrorCode, msg: impl Into<String>) -> Self {
        Self::Session {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn session_not_found(id: impl std::fmt::Display) -> Self {
        Self::session(SessionErrorCode::NotFound, format!("session {} not found", id))
    }

    pub fn session_inactive(id: impl std::fmt::Display) -> Self {
        Self::session(SessionErrorCode::Inactive, format!("session {} has ended", id))
    }

    /// Create a storage error.
    pub fn storage(code: DbErrorCode, msg: impl Into<String>) -> Self {
        Self::Storage {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn store_failed(msg: impl Into<String>) -> Self {
        Self::storage(DbErrorCode::StoreFailed, msg)
    }

    /// Create a rate limit error.
    pub fn rate_limit(
        code: RateLimitErrorCode,
        msg: impl Into<String>,
        retry_after: Option<u64>,
    ) -> Self {
        Self::RateLimit {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
            retry_after,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { http_status, .. } => *http_status,
            Self::Token { http_status, .. } => *http_status,
            Self::DuplicateAttendance { .. } => 409,
            Self::Session { http_status, .. } => *http_status,
            Self::Storage { http_status, .. } => *http_status,
            Self::RateLimit { http_status, .. } => *http_status,
            Self::Serialization(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Validation { code, .. } => Some(code),
            Self::Token { code, .. } => Some(code),
            Self::DuplicateAttendance { .. } => Some(DUPLICATE_ATTENDANCE_CODE),
            Self::Session { code, .. } => Some(code),
            Self::Storage { code, .. } => Some(code),
            Self::RateLimit { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether the caller can recover without operator involvement
    /// (re-scan, correct the input, or accept the existing record).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Storage { .. } | Self::Internal(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateAttendance { .. })
    }

    pub fn is_invalid_token(&self) -> bool {
        matches!(
            self,
            Self::Token {
                code: "TOKEN_001",
                ..
            }
        )
    }
}
