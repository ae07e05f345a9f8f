//! Domain models for the hostel booking core.
//!
//! These are plain serde structs with no ORM mechanics; related records are
//! fetched explicitly at the query layer rather than through schema-level
//! population.

use crate::error::BookingError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Allowed room capacity range.
pub const MIN_ROOM_CAPACITY: u32 = 1;
pub const MAX_ROOM_CAPACITY: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Single,
    Double,
    Triple,
    Quad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Inactive,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Active => "active",
            BookingStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    Inactive,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Active => "active",
            AssignmentStatus::Inactive => "inactive",
        }
    }
}

/// Semester within an academic year. Serialized as the number 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(try_from = "u8", into = "u8")]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub fn number(self) -> u8 {
        match self {
            Semester::First => 1,
            Semester::Second => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Semester::First),
            2 => Some(Semester::Second),
            _ => None,
        }
    }
}

impl Default for Semester {
    fn default() -> Self {
        Semester::First
    }
}

impl TryFrom<u8> for Semester {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Semester::from_number(value).ok_or_else(|| format!("invalid semester: {}", value))
    }
}

impl From<Semester> for u8 {
    fn from(value: Semester) -> Self {
        value.number()
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// An (academic year, semester) pair identifying a booking cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AcademicPeriod {
    pub academic_year: String,
    pub semester: Semester,
}

impl AcademicPeriod {
    pub fn label(&self) -> String {
        format!("{} Semester {}", self.academic_year, self.semester.number())
    }
}

/// A bookable room. Occupancy and availability are derived from active
/// assignments and written only by the occupancy tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Room {
    pub id: String,
    pub room_number: String,
    pub capacity: u32,
    pub room_type: RoomType,
    pub current_occupancy: u32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Build a new empty room, validating the capacity range.
    pub fn new(room_number: &str, capacity: u32, room_type: RoomType) -> Result<Self, BookingError> {
        let room_number = room_number.trim();
        if room_number.is_empty() {
            return Err(BookingError::Validation("room number is required".into()));
        }
        if !(MIN_ROOM_CAPACITY..=MAX_ROOM_CAPACITY).contains(&capacity) {
            return Err(BookingError::Validation(format!(
                "capacity must be between {} and {}",
                MIN_ROOM_CAPACITY, MAX_ROOM_CAPACITY
            )));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            room_number: room_number.to_string(),
            capacity,
            room_type,
            current_occupancy: 0,
            is_available: true,
            created_at: Utc::now(),
        })
    }
}

/// A student record; only what the booking core needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Student {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A student's claim on a room for an academic period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Booking {
    pub id: String,
    pub student_id: String,
    pub room_id: String,
    pub booking_date: DateTime<Utc>,
    pub terms_agreed: bool,
    pub status: BookingStatus,
    pub academic_year: String,
    pub semester: Semester,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable snapshot of a booking at archive time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingArchive {
    pub id: String,
    pub original_booking_id: String,
    pub student_id: String,
    pub room_id: String,
    pub room_number: String,
    pub booking_date: DateTime<Utc>,
    pub academic_year: String,
    pub semester: Semester,
    pub original_status: BookingStatus,
    pub original_created_at: DateTime<Utc>,
    pub original_updated_at: DateTime<Utc>,
    pub archived_at: DateTime<Utc>,
    /// Admin who triggered the archive, or None for system-initiated flows.
    pub archived_by: Option<String>,
}

/// Links a student to a room for an academic period. Active assignments are
/// what a room's occupancy is counted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoomAssignment {
    pub id: String,
    pub room_id: String,
    pub student_id: String,
    pub booking_id: Option<String>,
    pub academic_year: String,
    pub semester: Semester,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking portal settings, stored as a singleton settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PortalSettings {
    pub enabled: bool,
    /// Raw configured open bound; parsed tolerantly by the window evaluator.
    pub open_time: Option<String>,
    /// Raw configured close bound; parsed tolerantly by the window evaluator.
    pub close_time: Option<String>,
    #[serde(default)]
    pub emergency_lockdown: bool,
    #[serde(default)]
    pub lockdown_message: Option<String>,
}

/// Configured start dates for the two semesters of an academic year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SemesterDates {
    pub semester1: Option<NaiveDate>,
    pub semester2: Option<NaiveDate>,
}

/// Academic calendar settings, stored as a singleton settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AcademicSettings {
    pub current_academic_year: String,
    pub current_semester: Semester,
    #[serde(default)]
    pub semester_start_dates: HashMap<String, SemesterDates>,
    #[serde(default)]
    pub auto_archive_enabled: bool,
    #[serde(default = "default_retention_years")]
    pub archive_retention_years: u32,
}

fn default_retention_years() -> u32 {
    5
}
