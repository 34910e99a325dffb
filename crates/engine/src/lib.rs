//! Attendance engine services.
//!
//! [`SessionService`] owns session lifecycle, [`TokenService`] mints and
//! checks rotating codes, and [`AttendanceEngine`] enforces one record per
//! student per session. State changes are published on an [`EventBus`].

pub mod config;
pub mod events;
pub mod marking;
pub mod sessions;
pub mod tokens;

pub use config::EngineConfig;
pub use events::EventBus;
pub use marking::AttendanceEngine;
pub use sessions::SessionService;
pub use tokens::TokenService;

use attendance_core::Error;
use attendance_store::AttendanceStore;
use std::sync::Arc;

/// All engine services wired to one store and one event bus.
#[derive(Clone)]
pub struct Services {
    pub sessions: SessionService,
    pub tokens: TokenService,
    pub attendance: AttendanceEngine,
    pub events: EventBus,
}

impl Services {
    pub fn new(store: Arc<dyn AttendanceStore>, config: &EngineConfig) -> Self {
        let events = EventBus::new(config.event_capacity);
        let sessions = SessionService::new(store.clone(), events.clone());
        let tokens = TokenService::new(store.clone(), events.clone(), config.rotation_interval());
        let attendance = AttendanceEngine::new(
            store,
            tokens.clone(),
            config.geofence.fence(),
            events.clone(),
        );

        Self {
            sessions,
            tokens,
            attendance,
            events,
        }
    }
}

/// Counts storage failures before handing the error back.
pub(crate) fn track_storage(err: Error) -> Error {
    if matches!(err, Error::Storage { .. }) {
        telemetry::metrics().storage_errors.inc();
        tracing::error!(error = %err, "Attendance store failure");
    }
    err
}
