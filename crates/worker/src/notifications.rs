//! Relays engine events to the log.
//!
//! Stands in for a push transport: every event a client would receive on
//! `attendance:session:{id}` is written as one structured log line.

use attendance_core::AttendanceEvent;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

pub struct NotificationRelay {
    events: broadcast::Receiver<AttendanceEvent>,
}

impl NotificationRelay {
    pub fn new(events: broadcast::Receiver<AttendanceEvent>) -> Self {
        Self { events }
    }

    /// Runs until shutdown is signalled or the bus is dropped.
    /// Returns the number of events relayed.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut relayed = 0;

        loop {
            tokio::select! {
                received = self.events.recv() => match received {
                    Ok(event) => {
                        relay(&event);
                        relayed += 1;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification relay lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.changed() => break,
            }
        }

        debug!(relayed, "Notification relay stopped");
        relayed
    }
}

fn relay(event: &AttendanceEvent) {
    match event {
        AttendanceEvent::AttendanceMarked {
            student_id,
            status,
            geofencing_status,
            method,
            count,
            ..
        } => info!(
            topic = %event.topic(),
            event = event.name(),
            student_id = %student_id,
            status = status.as_str(),
            geofencing_status = geofencing_status.as_str(),
            method = ?method,
            count,
            "Notification"
        ),
        AttendanceEvent::TokenRotated { expires_at, .. } => debug!(
            topic = %event.topic(),
            event = event.name(),
            expires_at = %expires_at,
            "Notification"
        ),
        _ => info!(topic = %event.topic(), event = event.name(), "Notification"),
    }
}
