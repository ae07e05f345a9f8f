//! Route definitions for the booking feature.

use crate::handlers::{
    academic_settings_handler, cancel_booking_handler, create_booking_handler,
    create_room_handler, delete_student_handler, list_archives_handler, list_rooms_handler,
    portal_status_handler, register_student_handler, run_transition_handler,
    update_academic_handler, update_portal_handler, BookingApiState,
};
use axum::{
    routing::{delete, get, post, put},
    Router,
};

/// Creates a router containing all routes for the booking feature.
pub fn routes(state: BookingApiState) -> Router {
    Router::new()
        .route("/portal/status", get(portal_status_handler))
        .route("/admin/portal", put(update_portal_handler))
        .route(
            "/admin/academic",
            get(academic_settings_handler).put(update_academic_handler),
        )
        .route("/admin/academic/transition", post(run_transition_handler))
        .route("/rooms", get(list_rooms_handler))
        .route("/admin/rooms", post(create_room_handler))
        .route("/admin/students", post(register_student_handler))
        .route("/admin/students/{student_id}", delete(delete_student_handler))
        .route("/bookings", post(create_booking_handler))
        .route("/bookings/{booking_id}/cancel", post(cancel_booking_handler))
        .route("/students/{student_id}/archives", get(list_archives_handler))
        .with_state(state)
}
