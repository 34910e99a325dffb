//! In-process fan-out of domain events.

use attendance_core::AttendanceEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Broadcasts [`AttendanceEvent`]s to every current subscriber.
///
/// Publishing never blocks and never fails; with no subscribers the event
/// is dropped. Subscribers that fall more than `capacity` events behind
/// observe `RecvError::Lagged` and skip ahead.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AttendanceEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AttendanceEvent> {
        self.sender.subscribe()
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: AttendanceEvent) -> usize {
        trace!(event = event.name(), topic = %event.topic(), "Publishing event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
