//! Session lifecycle.

use attendance_core::{
    schema::{validate_faculty_id, validate_open_request, OpenSessionRequest},
    AttendanceEvent, Error, Result, Session,
};
use attendance_store::AttendanceStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::events::EventBus;
use crate::track_storage;

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn AttendanceStore>,
    events: EventBus,
}

impl SessionService {
    pub fn new(store: Arc<dyn AttendanceStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Opens an active session owned by `faculty_id`.
    pub async fn open(&self, faculty_id: &str, request: &OpenSessionRequest) -> Result<Session> {
        validate_faculty_id(faculty_id)?;
        validate_open_request(request)?;

        let session = Session::new(
            faculty_id,
            request.scope(),
            request.geofencing_enabled,
            Utc::now(),
        );
        let session = self
            .store
            .insert_session(session)
            .await
            .map_err(track_storage)?;

        telemetry::metrics().sessions_opened.inc();
        telemetry::metrics().active_sessions.inc();
        info!(
            session_id = %session.id,
            faculty_id = %session.faculty_id,
            subject = %session.subject,
            geofencing = session.geofencing_enabled,
            "Session opened"
        );

        self.events.publish(AttendanceEvent::SessionOpened {
            session_id: session.id,
            faculty_id: session.faculty_id.clone(),
            subject: session.subject.clone(),
            at: session.created_at,
        });

        Ok(session)
    }

    /// Looks a session up, failing with `SESSION_001` if it does not exist.
    pub async fn get(&self, id: Uuid) -> Result<Session> {
        self.find(id)
            .await?
            .ok_or_else(|| Error::session_not_found(id))
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Session>> {
        self.store.get_session(id).await.map_err(track_storage)
    }

    /// Ends a session. A second call fails with `SESSION_002`.
    pub async fn end(&self, id: Uuid) -> Result<Session> {
        let session = self
            .store
            .end_session(id, Utc::now())
            .await
            .map_err(track_storage)?;

        telemetry::metrics().sessions_ended.inc();
        telemetry::metrics().active_sessions.dec();
        info!(session_id = %id, "Session ended");

        if let Some(at) = session.ended_at {
            self.events
                .publish(AttendanceEvent::SessionEnded { session_id: id, at });
        }

        Ok(session)
    }
}
