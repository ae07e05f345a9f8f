//! Thin axum handlers mapping HTTP requests onto the booking core contracts.

use crate::academic::{self, SemesterTransition};
use crate::deletion::{DeletionSummary, StudentDeletion};
use crate::error::BookingError;
use crate::lifecycle::{ArchivePage, ArchiveQuery, BookingLifecycle, CreateBookingRequest};
use crate::models::{
    AcademicSettings, Booking, PortalSettings, Room, RoomType, Semester, Student,
};
use crate::store::{RoomStore, SettingsStore, StoreError, StudentStore};
use crate::window;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Shared state for the booking routes.
#[derive(Clone)]
pub struct BookingApiState {
    pub lifecycle: Arc<BookingLifecycle>,
    pub deletion: Arc<StudentDeletion>,
    pub rooms: Arc<dyn RoomStore>,
    pub students: Arc<dyn StudentStore>,
    pub settings: Arc<dyn SettingsStore>,
}

// --- Portal ---

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PortalStatusResponse {
    pub open: bool,
    #[serde(flatten)]
    pub settings: PortalSettings,
}

#[axum::debug_handler]
pub async fn portal_status_handler(
    State(state): State<BookingApiState>,
) -> Result<Json<PortalStatusResponse>, BookingError> {
    let settings = state.settings.portal().await?.unwrap_or_default();
    let open = window::is_open(&settings, Utc::now());
    Ok(Json(PortalStatusResponse { open, settings }))
}

#[axum::debug_handler]
pub async fn update_portal_handler(
    State(state): State<BookingApiState>,
    Json(settings): Json<PortalSettings>,
) -> Result<Json<PortalSettings>, BookingError> {
    state.settings.save_portal(settings.clone()).await?;
    info!(enabled = settings.enabled, "portal settings updated");
    Ok(Json(settings))
}

// --- Academic settings ---

#[axum::debug_handler]
pub async fn academic_settings_handler(
    State(state): State<BookingApiState>,
) -> Result<Json<AcademicSettings>, BookingError> {
    let settings = state.settings.academic().await?.ok_or_else(|| {
        BookingError::NotFound("academic settings are not configured".into())
    })?;
    Ok(Json(settings))
}

#[axum::debug_handler]
pub async fn update_academic_handler(
    State(state): State<BookingApiState>,
    Json(settings): Json<AcademicSettings>,
) -> Result<Json<AcademicSettings>, BookingError> {
    if settings.current_academic_year.trim().is_empty() {
        return Err(BookingError::Validation(
            "current academic year is required".into(),
        ));
    }
    state.settings.save_academic(settings.clone()).await?;
    info!(
        academic_year = %settings.current_academic_year,
        semester = %settings.current_semester,
        "academic settings updated"
    );
    Ok(Json(settings))
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TransitionResponse {
    pub transitioned: bool,
    pub academic_year: String,
    pub semester: Semester,
    pub bookings_cleared: u64,
}

/// Apply a pending semester transition, if the configured start dates say one
/// is due. With auto-archive enabled, inactive bookings are cleared to the
/// archive as part of the transition.
#[axum::debug_handler]
pub async fn run_transition_handler(
    State(state): State<BookingApiState>,
) -> Result<Json<TransitionResponse>, BookingError> {
    let mut settings = state.settings.academic().await?.ok_or_else(|| {
        BookingError::NotFound("academic settings are not configured".into())
    })?;

    match academic::should_transition(&settings, Utc::now()) {
        Some(SemesterTransition {
            new_semester,
            new_academic_year,
        }) => {
            settings.current_semester = new_semester;
            settings.current_academic_year = new_academic_year;
            state.settings.save_academic(settings.clone()).await?;

            let bookings_cleared = if settings.auto_archive_enabled {
                state.lifecycle.clear_inactive_bookings(None).await?
            } else {
                0
            };

            info!(
                academic_year = %settings.current_academic_year,
                semester = %settings.current_semester,
                bookings_cleared,
                "semester transition applied"
            );
            Ok(Json(TransitionResponse {
                transitioned: true,
                academic_year: settings.current_academic_year,
                semester: settings.current_semester,
                bookings_cleared,
            }))
        }
        None => Ok(Json(TransitionResponse {
            transitioned: false,
            academic_year: settings.current_academic_year,
            semester: settings.current_semester,
            bookings_cleared: 0,
        })),
    }
}

// --- Rooms ---

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateRoomPayload {
    pub room_number: String,
    pub capacity: u32,
    pub room_type: RoomType,
}

#[axum::debug_handler]
pub async fn create_room_handler(
    State(state): State<BookingApiState>,
    Json(payload): Json<CreateRoomPayload>,
) -> Result<(StatusCode, Json<Room>), BookingError> {
    if state
        .rooms
        .find_by_number(payload.room_number.trim())
        .await?
        .is_some()
    {
        return Err(BookingError::Conflict(format!(
            "room {} already exists",
            payload.room_number.trim()
        )));
    }
    let room = Room::new(&payload.room_number, payload.capacity, payload.room_type)?;
    // Two concurrent creates can both pass the lookup above; the unique index
    // rejects the loser, which is a conflict rather than a storage failure
    let room = state.rooms.insert(room).await.map_err(|e| match e {
        StoreError::Constraint(_) => BookingError::Conflict(format!(
            "room {} already exists",
            payload.room_number.trim()
        )),
        other => BookingError::Storage(other),
    })?;
    info!(room_number = %room.room_number, capacity = room.capacity, "room created");
    Ok((StatusCode::CREATED, Json(room)))
}

#[axum::debug_handler]
pub async fn list_rooms_handler(
    State(state): State<BookingApiState>,
) -> Result<Json<Vec<Room>>, BookingError> {
    Ok(Json(state.rooms.list().await?))
}

// --- Students ---

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterStudentPayload {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[axum::debug_handler]
pub async fn register_student_handler(
    State(state): State<BookingApiState>,
    Json(payload): Json<RegisterStudentPayload>,
) -> Result<(StatusCode, Json<Student>), BookingError> {
    let full_name = payload.full_name.trim();
    let email = payload.email.trim();
    if full_name.is_empty() {
        return Err(BookingError::Validation("full name is required".into()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(BookingError::Validation(
            "a valid email address is required".into(),
        ));
    }
    let student = state
        .students
        .insert(Student {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: payload.phone,
            created_at: Utc::now(),
        })
        .await?;
    info!(student_id = %student.id, "student registered");
    Ok((StatusCode::CREATED, Json(student)))
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct DeleteStudentParams {
    /// Admin triggering the deletion; absent for system-initiated removal.
    pub deleted_by: Option<String>,
}

#[axum::debug_handler]
pub async fn delete_student_handler(
    State(state): State<BookingApiState>,
    Path(student_id): Path<String>,
    Query(params): Query<DeleteStudentParams>,
) -> Result<Json<DeletionSummary>, BookingError> {
    let summary = state
        .deletion
        .delete_student(&student_id, params.deleted_by.as_deref())
        .await?;
    Ok(Json(summary))
}

// --- Bookings ---

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateBookingPayload {
    pub student_id: String,
    pub room_id: String,
    pub terms_agreed: bool,
}

#[axum::debug_handler]
pub async fn create_booking_handler(
    State(state): State<BookingApiState>,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<(StatusCode, Json<Booking>), BookingError> {
    let period = state.lifecycle.current_period().await?;
    let booking = state
        .lifecycle
        .create_booking(CreateBookingRequest {
            student_id: payload.student_id,
            room_id: payload.room_id,
            terms_agreed: payload.terms_agreed,
            period,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[axum::debug_handler]
pub async fn cancel_booking_handler(
    State(state): State<BookingApiState>,
    Path(booking_id): Path<String>,
) -> Result<StatusCode, BookingError> {
    state.lifecycle.cancel_booking(&booking_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Archives ---

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ArchiveListParams {
    pub academic_year: Option<String>,
    pub semester: Option<u8>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[axum::debug_handler]
pub async fn list_archives_handler(
    State(state): State<BookingApiState>,
    Path(student_id): Path<String>,
    Query(params): Query<ArchiveListParams>,
) -> Result<Json<ArchivePage>, BookingError> {
    let semester = match params.semester {
        Some(n) => Some(
            Semester::from_number(n)
                .ok_or_else(|| BookingError::Validation(format!("invalid semester: {}", n)))?,
        ),
        None => None,
    };
    let defaults = ArchiveQuery::default();
    let page = state
        .lifecycle
        .list_archives(
            &student_id,
            ArchiveQuery {
                academic_year: params.academic_year,
                semester,
                page: params.page.unwrap_or(defaults.page),
                limit: params.limit.unwrap_or(defaults.limit),
            },
        )
        .await?;
    Ok(Json(page))
}
