//! Student deletion cascade.
//!
//! Deleting a student archives every booking for audit, removes the live
//! booking and assignment rows, recomputes occupancy for every affected room,
//! and finally removes the student record. If the cascade fails partway,
//! occupancy is recomputed for every room touched before the failure so the
//! counters never stay stale.

use crate::error::BookingError;
use crate::events::{DomainEvent, EventBus};
use crate::lifecycle::BookingLifecycle;
use crate::models::AssignmentStatus;
use crate::occupancy::OccupancyTracker;
use crate::store::{AssignmentStore, BookingStore, StudentStore};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Counts reported back after a completed deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeletionSummary {
    pub bookings_archived: u64,
    pub assignments_removed: u64,
    pub rooms_affected: u64,
}

pub struct StudentDeletion {
    students: Arc<dyn StudentStore>,
    bookings: Arc<dyn BookingStore>,
    assignments: Arc<dyn AssignmentStore>,
    lifecycle: Arc<BookingLifecycle>,
    occupancy: Arc<OccupancyTracker>,
    events: EventBus,
}

impl StudentDeletion {
    pub fn new(
        students: Arc<dyn StudentStore>,
        bookings: Arc<dyn BookingStore>,
        assignments: Arc<dyn AssignmentStore>,
        lifecycle: Arc<BookingLifecycle>,
        occupancy: Arc<OccupancyTracker>,
        events: EventBus,
    ) -> Self {
        Self {
            students,
            bookings,
            assignments,
            lifecycle,
            occupancy,
            events,
        }
    }

    /// Remove a student and cascade to their bookings and assignments.
    ///
    /// `deleted_by` is the admin who triggered the deletion; `None` marks the
    /// archives as system-initiated.
    pub async fn delete_student(
        &self,
        student_id: &str,
        deleted_by: Option<&str>,
    ) -> Result<DeletionSummary, BookingError> {
        self.students
            .find(student_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("student {}", student_id)))?;

        let mut touched_rooms = BTreeSet::new();
        let result = self
            .run_cascade(student_id, deleted_by, &mut touched_rooms)
            .await;

        if result.is_err() {
            // Bring occupancy back in line for rooms touched before the
            // failure; the caller may retry the whole deletion afterwards.
            for room_id in &touched_rooms {
                if let Err(e) = self.occupancy.recompute(room_id).await {
                    error!(room_id, error = %e, "occupancy recompute after failed deletion");
                }
            }
        }
        result
    }

    async fn run_cascade(
        &self,
        student_id: &str,
        deleted_by: Option<&str>,
        touched_rooms: &mut BTreeSet<String>,
    ) -> Result<DeletionSummary, BookingError> {
        let bookings = self.bookings.find_by_student(student_id).await?;
        let mut bookings_archived = 0u64;
        for booking in &bookings {
            match self.lifecycle.archive_booking(booking, deleted_by).await {
                Ok(_) => bookings_archived += 1,
                Err(BookingError::Integrity(_)) => {
                    // A retried deletion finds the archive from the first
                    // attempt; keep the existing snapshot and move on.
                    warn!(booking_id = %booking.id, "booking already archived, keeping snapshot");
                    bookings_archived += 1;
                }
                Err(e) => return Err(e),
            }
            self.bookings.delete(&booking.id).await?;
        }

        let now = Utc::now();
        let assignments = self.assignments.find_by_student(student_id).await?;
        let mut assignments_removed = 0u64;
        for assignment in assignments {
            if assignment.status == AssignmentStatus::Active {
                self.assignments
                    .set_status(&assignment.id, AssignmentStatus::Inactive, now)
                    .await?;
            }
            self.assignments.delete(&assignment.id).await?;
            touched_rooms.insert(assignment.room_id.clone());
            assignments_removed += 1;
        }

        for room_id in touched_rooms.iter() {
            self.occupancy.recompute(room_id).await?;
        }

        self.students.delete(student_id).await?;

        let summary = DeletionSummary {
            bookings_archived,
            assignments_removed,
            rooms_affected: touched_rooms.len() as u64,
        };
        info!(
            student_id,
            bookings_archived = summary.bookings_archived,
            assignments_removed = summary.assignments_removed,
            rooms_affected = summary.rooms_affected,
            "student deleted"
        );
        self.events.publish(DomainEvent::StudentDeleted {
            student_id: student_id.to_string(),
            bookings_archived: summary.bookings_archived,
            rooms_affected: summary.rooms_affected,
        });
        Ok(summary)
    }
}
