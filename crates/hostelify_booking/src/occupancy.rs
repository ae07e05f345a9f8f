//! Room occupancy tracking.
//!
//! A room's `current_occupancy`/`is_available` pair is derived state: it must
//! always equal the count of active assignments for that room. There is no
//! background reconciliation job, so every code path that flips an
//! assignment's status calls `recompute` as part of the same logical
//! operation. The tracker only reports and persists; capacity gating is the
//! booking lifecycle's job.

use crate::error::BookingError;
use crate::events::{DomainEvent, EventBus};
use crate::locks::KeyedLocks;
use crate::store::{AssignmentStore, RoomStore};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error};

/// Snapshot of a room's derived occupancy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoomOccupancy {
    pub current_occupancy: u32,
    pub is_available: bool,
}

pub struct OccupancyTracker {
    rooms: Arc<dyn RoomStore>,
    assignments: Arc<dyn AssignmentStore>,
    events: EventBus,
    locks: KeyedLocks,
}

impl OccupancyTracker {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        assignments: Arc<dyn AssignmentStore>,
        events: EventBus,
    ) -> Self {
        Self {
            rooms,
            assignments,
            events,
            locks: KeyedLocks::new(),
        }
    }

    /// Lock guarding a room's count-then-write sequences. The booking
    /// lifecycle holds this across its capacity check-then-act so a
    /// concurrent recompute cannot interleave with it.
    pub fn room_lock(&self, room_id: &str) -> Arc<AsyncMutex<()>> {
        self.locks.for_key(room_id)
    }

    /// Recompute a room's occupancy from its active assignments and persist
    /// the result. An occupancy count above capacity is an integrity failure:
    /// the creating operation should have rejected the booking.
    ///
    /// Count and write run under the room lock; two concurrent recomputes
    /// cannot interleave count-then-write and leave a stale value behind.
    pub async fn recompute(&self, room_id: &str) -> Result<RoomOccupancy, BookingError> {
        let lock = self.room_lock(room_id);
        let _guard = lock.lock().await;
        self.recompute_locked(room_id).await
    }

    /// Recompute assuming the caller already holds the room lock.
    pub(crate) async fn recompute_locked(
        &self,
        room_id: &str,
    ) -> Result<RoomOccupancy, BookingError> {
        let room = self
            .rooms
            .find(room_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("room {}", room_id)))?;

        let count = self.assignments.count_active_for_room(room_id).await?;
        if count > room.capacity {
            error!(
                room_id,
                count,
                capacity = room.capacity,
                "active assignment count exceeds room capacity"
            );
            return Err(BookingError::Integrity(format!(
                "room {} has {} active assignments but capacity {}",
                room_id, count, room.capacity
            )));
        }

        let is_available = count < room.capacity;
        self.rooms
            .update_occupancy(room_id, count, is_available)
            .await?;

        debug!(room_id, count, is_available, "room occupancy recomputed");
        self.events.publish(DomainEvent::RoomOccupancyChanged {
            room_id: room_id.to_string(),
            current_occupancy: count,
            is_available,
        });

        Ok(RoomOccupancy {
            current_occupancy: count,
            is_available,
        })
    }
}
