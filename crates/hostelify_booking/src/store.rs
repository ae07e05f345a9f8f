//! Storage traits for the booking core.
//!
//! Components receive these traits by injection (`Arc<dyn …Store>`), so the
//! domain logic is testable without a live database. The SQL implementations
//! live in the `hostelify-db` crate; tests use in-memory implementations.
//!
//! Methods return boxed futures so the traits stay object-safe.

use crate::models::{
    AcademicSettings, AssignmentStatus, Booking, BookingArchive, BookingStatus, PortalSettings,
    Room, RoomAssignment, Semester, Student,
};
use chrono::{DateTime, Utc};
use hostelify_common::BoxFuture;
use thiserror::Error;

/// Well-known settings keys for the singleton settings documents.
pub const PORTAL_SETTINGS_KEY: &str = "portal";
pub const ACADEMIC_SETTINGS_KEY: &str = "academic";

/// Errors reported by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Storage for rooms.
///
/// `update_occupancy` is the only write path for the derived
/// `current_occupancy`/`is_available` pair; it is called exclusively by the
/// occupancy tracker.
pub trait RoomStore: Send + Sync {
    fn insert(&self, room: Room) -> BoxFuture<'_, Room, StoreError>;

    fn find(&self, room_id: &str) -> BoxFuture<'_, Option<Room>, StoreError>;

    fn find_by_number(&self, room_number: &str) -> BoxFuture<'_, Option<Room>, StoreError>;

    fn list(&self) -> BoxFuture<'_, Vec<Room>, StoreError>;

    fn update_occupancy(
        &self,
        room_id: &str,
        current_occupancy: u32,
        is_available: bool,
    ) -> BoxFuture<'_, (), StoreError>;
}

/// Storage for student records.
pub trait StudentStore: Send + Sync {
    fn insert(&self, student: Student) -> BoxFuture<'_, Student, StoreError>;

    fn find(&self, student_id: &str) -> BoxFuture<'_, Option<Student>, StoreError>;

    /// Returns `true` if a record was deleted.
    fn delete(&self, student_id: &str) -> BoxFuture<'_, bool, StoreError>;
}

/// Storage for bookings.
pub trait BookingStore: Send + Sync {
    fn insert(&self, booking: Booking) -> BoxFuture<'_, Booking, StoreError>;

    fn find(&self, booking_id: &str) -> BoxFuture<'_, Option<Booking>, StoreError>;

    /// The student's current active booking, if any.
    fn find_active_by_student(
        &self,
        student_id: &str,
    ) -> BoxFuture<'_, Option<Booking>, StoreError>;

    /// All bookings for a student, active and inactive.
    fn find_by_student(&self, student_id: &str) -> BoxFuture<'_, Vec<Booking>, StoreError>;

    fn find_by_status(&self, status: BookingStatus) -> BoxFuture<'_, Vec<Booking>, StoreError>;

    fn set_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'_, (), StoreError>;

    /// Returns `true` if a record was deleted.
    fn delete(&self, booking_id: &str) -> BoxFuture<'_, bool, StoreError>;
}

/// Storage for room assignments.
pub trait AssignmentStore: Send + Sync {
    fn insert(&self, assignment: RoomAssignment) -> BoxFuture<'_, RoomAssignment, StoreError>;

    /// Assignments matching a (room, student, academic period) tuple, any
    /// status. The uniqueness constraint allows at most one row per status.
    fn find_for_period(
        &self,
        room_id: &str,
        student_id: &str,
        academic_year: &str,
        semester: Semester,
    ) -> BoxFuture<'_, Vec<RoomAssignment>, StoreError>;

    fn find_by_booking(&self, booking_id: &str) -> BoxFuture<'_, Vec<RoomAssignment>, StoreError>;

    fn find_by_student(&self, student_id: &str) -> BoxFuture<'_, Vec<RoomAssignment>, StoreError>;

    /// Count of active assignments for a room; the source of truth for its
    /// occupancy.
    fn count_active_for_room(&self, room_id: &str) -> BoxFuture<'_, u32, StoreError>;

    fn set_status(
        &self,
        assignment_id: &str,
        status: AssignmentStatus,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'_, (), StoreError>;

    /// Flip an inactive assignment back to active and rebind it to a new
    /// booking.
    fn reactivate(
        &self,
        assignment_id: &str,
        booking_id: &str,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'_, (), StoreError>;

    /// Returns `true` if a record was deleted.
    fn delete(&self, assignment_id: &str) -> BoxFuture<'_, bool, StoreError>;
}

/// Filter and pagination for archive listings.
#[derive(Debug, Clone, Default)]
pub struct ArchiveFilter {
    pub academic_year: Option<String>,
    pub semester: Option<Semester>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

/// Storage for booking archives. Archives are insert-only.
pub trait ArchiveStore: Send + Sync {
    fn insert(&self, archive: BookingArchive) -> BoxFuture<'_, BookingArchive, StoreError>;

    fn find_by_original(
        &self,
        original_booking_id: &str,
    ) -> BoxFuture<'_, Option<BookingArchive>, StoreError>;

    /// One page of a student's archives plus the total matching count,
    /// sorted by (academic_year desc, semester desc, archived_at desc).
    fn list_for_student(
        &self,
        student_id: &str,
        filter: ArchiveFilter,
    ) -> BoxFuture<'_, (Vec<BookingArchive>, u64), StoreError>;
}

/// Storage for the singleton settings documents, keyed by the well-known
/// settings keys and written with upsert semantics.
pub trait SettingsStore: Send + Sync {
    fn portal(&self) -> BoxFuture<'_, Option<PortalSettings>, StoreError>;

    fn save_portal(&self, settings: PortalSettings) -> BoxFuture<'_, (), StoreError>;

    fn academic(&self) -> BoxFuture<'_, Option<AcademicSettings>, StoreError>;

    fn save_academic(&self, settings: AcademicSettings) -> BoxFuture<'_, (), StoreError>;
}
