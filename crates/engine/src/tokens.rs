//! Token issuance and validation.

use attendance_core::{
    error::TokenErrorCode, is_well_formed, limits::TOKEN_ISSUE_ATTEMPTS, AttendanceEvent, Error,
    InvalidReason, QrPayload, QrToken, Result, TokenValidation,
};
use attendance_store::{AttendanceStore, TokenInsert};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::EventBus;
use crate::track_storage;

#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn AttendanceStore>,
    events: EventBus,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(store: Arc<dyn AttendanceStore>, events: EventBus, lifetime: Duration) -> Self {
        Self {
            store,
            events,
            lifetime,
        }
    }

    /// Token lifetime, which is also the rotation cadence.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Mints and persists a fresh token for an active session.
    ///
    /// Earlier tokens stay valid until their own expiry. Fails with
    /// `SESSION_001` for an unknown session and `SESSION_002` once it ended.
    pub async fn issue(&self, session_id: Uuid) -> Result<QrToken> {
        let session = self
            .store
            .get_session(session_id)
            .await
            .map_err(track_storage)?
            .ok_or_else(|| Error::session_not_found(session_id))?;
        session.ensure_active()?;

        for attempt in 1..=TOKEN_ISSUE_ATTEMPTS {
            let token = QrToken::issue(session_id, Utc::now(), self.lifetime);
            match self
                .store
                .insert_token(token.clone())
                .await
                .map_err(track_storage)?
            {
                TokenInsert::Inserted => {
                    telemetry::metrics().tokens_issued.inc();
                    debug!(
                        session_id = %session_id,
                        expires_at = %token.expires_at,
                        "Token issued"
                    );
                    self.events.publish(AttendanceEvent::TokenRotated {
                        session_id,
                        expires_at: token.expires_at,
                    });
                    return Ok(token);
                }
                TokenInsert::Conflict => {
                    telemetry::metrics().token_collisions.inc();
                    warn!(session_id = %session_id, attempt, "Token string collision, retrying");
                }
            }
        }

        Err(Error::internal(format!(
            "could not mint a unique token for session {} after {} attempts",
            session_id, TOKEN_ISSUE_ATTEMPTS
        )))
    }

    /// Validates `token` against `session_id` at `now`.
    ///
    /// A negative answer is an ordinary result, not an error; only storage
    /// failures return `Err`.
    pub async fn validate_at(
        &self,
        session_id: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenValidation> {
        if !is_well_formed(token) {
            return Ok(TokenValidation::Invalid(InvalidReason::NotFound));
        }
        let found = self.store.find_token(token).await.map_err(track_storage)?;
        Ok(TokenValidation::of(found.as_ref(), session_id, now))
    }

    pub async fn validate(&self, session_id: Uuid, token: &str) -> Result<TokenValidation> {
        self.validate_at(session_id, token, Utc::now()).await
    }

    /// The newest still-live token as a displayable payload.
    ///
    /// `TOKEN_002` when the session has ended or its latest token expired.
    pub async fn current_payload(&self, session_id: Uuid) -> Result<QrPayload> {
        let session = self
            .store
            .get_session(session_id)
            .await
            .map_err(track_storage)?
            .ok_or_else(|| Error::session_not_found(session_id))?;

        let no_live_token = || {
            Error::token(
                TokenErrorCode::NoLiveToken,
                format!("no live code for session {}", session_id),
            )
        };

        if !session.is_active() {
            return Err(no_live_token());
        }

        let token = self
            .store
            .latest_token(session_id)
            .await
            .map_err(track_storage)?
            .filter(|t| !t.is_expired(Utc::now()))
            .ok_or_else(no_live_token)?;

        Ok(QrPayload::new(&token, &session.scope()))
    }
}
