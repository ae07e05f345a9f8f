//! Domain events published after successful mutations.
//!
//! The core only publishes; transport (socket broadcast, webhooks) is an
//! external relay subscribing to the bus.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DomainEvent {
    RoomOccupancyChanged {
        room_id: String,
        current_occupancy: u32,
        is_available: bool,
    },
    BookingCreated {
        booking_id: String,
        student_id: String,
        room_id: String,
    },
    BookingCancelled {
        booking_id: String,
        room_id: String,
    },
    BookingArchived {
        booking_id: String,
        archive_id: String,
        student_id: String,
    },
    StudentDeleted {
        student_id: String,
        bookings_archived: u64,
        rooms_affected: u64,
    },
}

/// Broadcast bus for domain events. Cheap to clone; subscribers that lag
/// simply miss events, which is acceptable for a relay layer.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: DomainEvent) {
        debug!(?event, "publishing domain event");
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
