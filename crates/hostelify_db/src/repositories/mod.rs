//! SQL repositories backing the booking storage traits.
//!
//! Each repository owns its schema (`init_schema`) and maps rows manually;
//! `DateTime<Utc>` does not implement `Decode` for `sqlx::Any`, so timestamps
//! are persisted as RFC 3339 TEXT columns.

pub mod archives_sql;
pub mod assignments_sql;
pub mod bookings_sql;
pub mod rooms_sql;
pub mod settings_sql;
pub mod students_sql;

pub use archives_sql::SqlArchiveRepository;
pub use assignments_sql::SqlAssignmentRepository;
pub use bookings_sql::SqlBookingRepository;
pub use rooms_sql::SqlRoomRepository;
pub use settings_sql::SqlSettingsRepository;
pub use students_sql::SqlStudentRepository;

use chrono::{DateTime, Utc};
use hostelify_booking::models::{AssignmentStatus, BookingStatus, Semester};
use hostelify_booking::store::StoreError;

pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("bad timestamp {:?}: {}", raw, e)))
}

/// Map a sqlx error, surfacing unique-index violations as constraint errors.
pub(crate) fn store_err(e: sqlx::Error) -> StoreError {
    let msg = e.to_string();
    if msg.contains("UNIQUE constraint") || msg.contains("unique constraint") {
        StoreError::Constraint(msg)
    } else {
        StoreError::Query(msg)
    }
}

pub(crate) fn booking_status_from_str(raw: &str) -> Result<BookingStatus, StoreError> {
    match raw {
        "active" => Ok(BookingStatus::Active),
        "inactive" => Ok(BookingStatus::Inactive),
        other => Err(StoreError::Serialization(format!(
            "unknown booking status {:?}",
            other
        ))),
    }
}

pub(crate) fn assignment_status_from_str(raw: &str) -> Result<AssignmentStatus, StoreError> {
    match raw {
        "active" => Ok(AssignmentStatus::Active),
        "inactive" => Ok(AssignmentStatus::Inactive),
        other => Err(StoreError::Serialization(format!(
            "unknown assignment status {:?}",
            other
        ))),
    }
}

pub(crate) fn semester_from_i64(raw: i64) -> Result<Semester, StoreError> {
    u8::try_from(raw)
        .ok()
        .and_then(Semester::from_number)
        .ok_or_else(|| StoreError::Serialization(format!("unknown semester {}", raw)))
}
