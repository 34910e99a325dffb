//! Rotating QR tokens.
//!
//! A token proves its bearer was shown the live code for one session within
//! a bounded window. Validity is decided purely by store presence, matching
//! session id, and `now < expires_at`; the embedded timestamp and the payload
//! display fields carry no authority.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

use crate::limits::{TOKEN_PATTERN, TOKEN_RANDOM_BYTES};
use crate::session::SessionScope;

/// Compiled token regex (lazy initialization).
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("invalid token pattern"));

/// A persisted, session-scoped token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrToken {
    pub id: Uuid,
    pub session_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl QrToken {
    /// Mints a token for `session_id` that lives for `lifetime` from `now`.
    pub fn issue(session_id: Uuid, now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            token: generate_token_string(now),
            expires_at: now + lifetime,
            created_at: now,
        }
    }

    /// Whether the token has passed its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks scope and expiry against the session being verified.
    pub fn check(&self, session_id: Uuid, now: DateTime<Utc>) -> TokenValidation {
        if self.session_id != session_id {
            return TokenValidation::Invalid(InvalidReason::WrongSession);
        }
        if self.is_expired(now) {
            return TokenValidation::Invalid(InvalidReason::Expired);
        }
        TokenValidation::Valid
    }

    /// Lifetime fixed at issuance.
    pub fn lifetime(&self) -> Duration {
        self.expires_at - self.created_at
    }
}

/// Generates `qr_<issued millis>_<128 random bits as hex>`.
pub fn generate_token_string(now: DateTime<Utc>) -> String {
    let mut buf = [0u8; TOKEN_RANDOM_BYTES];
    OsRng.fill_bytes(&mut buf);
    format!("qr_{}_{}", now.timestamp_millis(), hex::encode(buf))
}

/// Whether `token` has the shape of an issued token string.
///
/// Shape alone confers nothing; this only lets callers skip a store lookup.
pub fn is_well_formed(token: &str) -> bool {
    TOKEN_REGEX.is_match(token)
}

/// Why a token failed validation. Callers surface all of these the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    NotFound,
    WrongSession,
    Expired,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::WrongSession => "wrong_session",
            Self::Expired => "expired",
        }
    }
}

/// Single boolean gate consumed immediately before a marking attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidation {
    Valid,
    Invalid(InvalidReason),
}

impl TokenValidation {
    /// Validates an optional store lookup result.
    pub fn of(found: Option<&QrToken>, session_id: Uuid, now: DateTime<Utc>) -> Self {
        match found {
            Some(token) => token.check(session_id, now),
            None => Self::Invalid(InvalidReason::NotFound),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Object encoded into the displayed QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub session_id: Uuid,
    pub token: String,
    /// Issuance time in epoch milliseconds (informational).
    pub timestamp: i64,
    pub subject: String,
    pub semester: u32,
    pub branch: String,
}

impl QrPayload {
    pub fn new(token: &QrToken, scope: &SessionScope) -> Self {
        Self {
            session_id: token.session_id,
            token: token.token.clone(),
            timestamp: token.created_at.timestamp_millis(),
            subject: scope.subject.clone(),
            semester: scope.semester,
            branch: scope.branch.clone(),
        }
    }
}
