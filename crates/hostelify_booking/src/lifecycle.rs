//! Booking lifecycle: creation, cancellation, archival, and archive listing.
//!
//! A booking's persisted states are `active` and `inactive`; archival copies
//! the booking into the archive collection as a terminal side-channel, it is
//! not a third state.

use crate::academic;
use crate::error::BookingError;
use crate::events::{DomainEvent, EventBus};
use crate::locks::KeyedLocks;
use crate::models::{
    AcademicPeriod, AssignmentStatus, Booking, BookingArchive, BookingStatus, RoomAssignment,
    Student,
};
use crate::occupancy::OccupancyTracker;
use crate::store::{
    ArchiveFilter, ArchiveStore, AssignmentStore, BookingStore, RoomStore, SettingsStore,
    StudentStore,
};
use crate::window;
use chrono::Utc;
use hostelify_common::{BoxedError, NotificationService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Input for a booking creation attempt.
#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub student_id: String,
    pub room_id: String,
    pub terms_agreed: bool,
    pub period: AcademicPeriod,
}

/// Query parameters for archive listings.
#[derive(Debug, Clone)]
pub struct ArchiveQuery {
    pub academic_year: Option<String>,
    pub semester: Option<crate::models::Semester>,
    pub page: u32,
    pub limit: u32,
}

impl Default for ArchiveQuery {
    fn default() -> Self {
        Self {
            academic_year: None,
            semester: None,
            page: 1,
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ArchivePage {
    pub archives: Vec<BookingArchive>,
    pub pagination: Pagination,
}

pub struct BookingLifecycle {
    rooms: Arc<dyn RoomStore>,
    students: Arc<dyn StudentStore>,
    bookings: Arc<dyn BookingStore>,
    assignments: Arc<dyn AssignmentStore>,
    archives: Arc<dyn ArchiveStore>,
    settings: Arc<dyn SettingsStore>,
    occupancy: Arc<OccupancyTracker>,
    events: EventBus,
    student_locks: KeyedLocks,
    notifier: Option<Arc<dyn NotificationService<Error = BoxedError>>>,
}

impl BookingLifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        students: Arc<dyn StudentStore>,
        bookings: Arc<dyn BookingStore>,
        assignments: Arc<dyn AssignmentStore>,
        archives: Arc<dyn ArchiveStore>,
        settings: Arc<dyn SettingsStore>,
        occupancy: Arc<OccupancyTracker>,
        events: EventBus,
    ) -> Self {
        Self {
            rooms,
            students,
            bookings,
            assignments,
            archives,
            settings,
            occupancy,
            events,
            student_locks: KeyedLocks::new(),
            notifier: None,
        }
    }

    /// Attach a notification service for booking confirmations.
    pub fn with_notifier(
        mut self,
        notifier: Arc<dyn NotificationService<Error = BoxedError>>,
    ) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Create a booking for a student in a room for the given period.
    ///
    /// Preconditions: the booking portal is open, terms are agreed, the
    /// student has no active booking, and the room has a free slot at the
    /// instant of commit. The check-then-act sequence runs under the
    /// student's and the room's locks so a concurrent attempt on the last
    /// slot loses with `Capacity` instead of overbooking.
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        let portal = self.settings.portal().await?.unwrap_or_default();
        if !window::is_open(&portal, Utc::now()) {
            debug!(
                student_id = %request.student_id,
                "booking attempt while portal closed"
            );
            return Err(BookingError::Validation(
                "the booking portal is currently closed".into(),
            ));
        }

        if !request.terms_agreed {
            return Err(BookingError::Validation(
                "terms and conditions must be agreed to book a room".into(),
            ));
        }

        let student = self
            .students
            .find(&request.student_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("student {}", request.student_id)))?;

        let student_lock = self.student_locks.for_key(&request.student_id);
        let _student_guard = student_lock.lock().await;
        // The occupancy tracker's room lock also serializes every recompute,
        // so a concurrent cancel cannot write a stale count over ours
        let room_lock = self.occupancy.room_lock(&request.room_id);
        let _room_guard = room_lock.lock().await;

        if let Some(existing) = self
            .bookings
            .find_active_by_student(&request.student_id)
            .await?
        {
            debug!(
                student_id = %request.student_id,
                booking_id = %existing.id,
                "student already has an active booking"
            );
            return Err(BookingError::Conflict(
                "student already has an active booking".into(),
            ));
        }

        let room = self
            .rooms
            .find(&request.room_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("room {}", request.room_id)))?;

        let occupied = self.assignments.count_active_for_room(&room.id).await?;
        if occupied >= room.capacity {
            debug!(room_id = %room.id, occupied, capacity = room.capacity, "room full");
            return Err(BookingError::Capacity {
                room_id: room.id.clone(),
            });
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            student_id: request.student_id.clone(),
            room_id: room.id.clone(),
            booking_date: now,
            terms_agreed: true,
            status: BookingStatus::Active,
            academic_year: request.period.academic_year.clone(),
            semester: request.period.semester,
            created_at: now,
            updated_at: now,
        };
        let booking = self.bookings.insert(booking).await?;

        self.ensure_active_assignment(&booking).await?;
        self.occupancy.recompute_locked(&room.id).await?;

        info!(
            booking_id = %booking.id,
            student_id = %booking.student_id,
            room = %room.room_number,
            period = %request.period.label(),
            "booking created"
        );
        self.events.publish(DomainEvent::BookingCreated {
            booking_id: booking.id.clone(),
            student_id: booking.student_id.clone(),
            room_id: booking.room_id.clone(),
        });

        self.send_confirmation(&student, &room.room_number, &request.period);

        Ok(booking)
    }

    /// Create or reactivate the assignment backing a booking.
    async fn ensure_active_assignment(&self, booking: &Booking) -> Result<(), BookingError> {
        let existing = self
            .assignments
            .find_for_period(
                &booking.room_id,
                &booking.student_id,
                &booking.academic_year,
                booking.semester,
            )
            .await?;

        let now = Utc::now();
        if let Some(inactive) = existing
            .iter()
            .find(|a| a.status == AssignmentStatus::Inactive)
        {
            debug!(assignment_id = %inactive.id, "reactivating existing assignment");
            self.assignments
                .reactivate(&inactive.id, &booking.id, now)
                .await?;
            return Ok(());
        }

        self.assignments
            .insert(RoomAssignment {
                id: Uuid::new_v4().to_string(),
                room_id: booking.room_id.clone(),
                student_id: booking.student_id.clone(),
                booking_id: Some(booking.id.clone()),
                academic_year: booking.academic_year.clone(),
                semester: booking.semester,
                status: AssignmentStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .await?;
        Ok(())
    }

    fn send_confirmation(&self, student: &Student, room_number: &str, period: &AcademicPeriod) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        let to = student.email.clone();
        let subject = "Room booking confirmed".to_string();
        let body = format!(
            "Your booking for room {} ({}) has been confirmed.",
            room_number,
            period.label()
        );
        // Fire-and-forget; delivery retry policy belongs to the notifier.
        tokio::spawn(async move {
            if let Err(e) = notifier.send_email(&to, &subject, &body).await {
                warn!(error = %e, "booking confirmation email failed");
            }
        });
    }

    /// Transition a booking to inactive and release its room slot.
    /// Idempotent: cancelling an already-inactive booking is a no-op.
    pub async fn cancel_booking(&self, booking_id: &str) -> Result<(), BookingError> {
        let booking = self
            .bookings
            .find(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", booking_id)))?;

        if booking.status == BookingStatus::Inactive {
            debug!(booking_id, "booking already inactive, nothing to cancel");
            return Ok(());
        }

        let now = Utc::now();
        self.bookings
            .set_status(&booking.id, BookingStatus::Inactive, now)
            .await?;

        for assignment in self.assignments.find_by_booking(&booking.id).await? {
            if assignment.status == AssignmentStatus::Active {
                self.assignments
                    .set_status(&assignment.id, AssignmentStatus::Inactive, now)
                    .await?;
            }
        }

        self.occupancy.recompute(&booking.room_id).await?;

        info!(booking_id, room_id = %booking.room_id, "booking cancelled");
        self.events.publish(DomainEvent::BookingCancelled {
            booking_id: booking.id.clone(),
            room_id: booking.room_id.clone(),
        });
        Ok(())
    }

    /// Archive a booking as an immutable snapshot keyed by the original
    /// booking id. A second archive attempt for the same booking is a
    /// data-integrity alarm, not a retryable condition.
    pub async fn archive_booking(
        &self,
        booking: &Booking,
        archived_by: Option<&str>,
    ) -> Result<BookingArchive, BookingError> {
        if self.archives.find_by_original(&booking.id).await?.is_some() {
            error!(booking_id = %booking.id, "duplicate archive attempt");
            return Err(BookingError::Integrity(format!(
                "archive already exists for booking {}",
                booking.id
            )));
        }

        let room_number = self
            .rooms
            .find(&booking.room_id)
            .await?
            .map(|room| room.room_number)
            .unwrap_or_default();

        let archive = BookingArchive {
            id: Uuid::new_v4().to_string(),
            original_booking_id: booking.id.clone(),
            student_id: booking.student_id.clone(),
            room_id: booking.room_id.clone(),
            room_number,
            booking_date: booking.booking_date,
            academic_year: booking.academic_year.clone(),
            semester: booking.semester,
            original_status: booking.status,
            original_created_at: booking.created_at,
            original_updated_at: booking.updated_at,
            archived_at: Utc::now(),
            archived_by: archived_by.map(String::from),
        };
        let archive = self.archives.insert(archive).await?;

        info!(
            booking_id = %booking.id,
            archive_id = %archive.id,
            archived_by = archived_by.unwrap_or("system"),
            "booking archived"
        );
        self.events.publish(DomainEvent::BookingArchived {
            booking_id: booking.id.clone(),
            archive_id: archive.id.clone(),
            student_id: booking.student_id.clone(),
        });
        Ok(archive)
    }

    /// Archive and remove every inactive booking (administrative clearing,
    /// typically run at a semester transition). A booking that already has an
    /// archive keeps its existing snapshot. Returns the number of bookings
    /// cleared.
    pub async fn clear_inactive_bookings(
        &self,
        archived_by: Option<&str>,
    ) -> Result<u64, BookingError> {
        let inactive = self.bookings.find_by_status(BookingStatus::Inactive).await?;
        let mut cleared = 0u64;
        for booking in &inactive {
            match self.archive_booking(booking, archived_by).await {
                Ok(_) => {}
                Err(BookingError::Integrity(_)) => {
                    warn!(booking_id = %booking.id, "booking already archived, keeping snapshot");
                }
                Err(e) => return Err(e),
            }
            self.bookings.delete(&booking.id).await?;
            cleared += 1;
        }
        if cleared > 0 {
            info!(cleared, "inactive bookings cleared to archive");
        }
        Ok(cleared)
    }

    /// List a student's booking archives, filtered and paginated.
    pub async fn list_archives(
        &self,
        student_id: &str,
        query: ArchiveQuery,
    ) -> Result<ArchivePage, BookingError> {
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);

        let (archives, total) = self
            .archives
            .list_for_student(
                student_id,
                ArchiveFilter {
                    academic_year: query.academic_year,
                    semester: query.semester,
                    page,
                    limit,
                },
            )
            .await?;

        let pages = total.div_ceil(limit as u64);
        Ok(ArchivePage {
            archives,
            pagination: Pagination {
                page,
                limit,
                total,
                pages,
            },
        })
    }

    /// Resolve the current academic period from the academic settings.
    pub async fn current_period(&self) -> Result<AcademicPeriod, BookingError> {
        let settings = self.settings.academic().await?.ok_or_else(|| {
            BookingError::Validation("academic settings are not configured".into())
        })?;
        Ok(academic::current_period(&settings))
    }
}
