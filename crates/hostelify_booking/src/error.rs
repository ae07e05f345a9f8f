//! Error taxonomy for booking operations.
//!
//! Every operation returns a typed failure from this enum; the handler layer
//! maps variants to HTTP responses. Transient storage errors are retried by
//! the storage client, not here.

use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hostelify_common::HttpStatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookingError {
    /// Caller input fails a precondition. Never retried automatically.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A business invariant would be violated by this operation as requested.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The room has no available slot at commit time. A normal, expected
    /// outcome; the losing side of a capacity race receives this too.
    #[error("room {room_id} has no available slots")]
    Capacity { room_id: String },

    /// Referenced room/student/booking does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An internal invariant is violated. Logged loudly, never silently
    /// patched over.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// Storage-layer failure.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl HttpStatusCode for BookingError {
    fn status_code(&self) -> u16 {
        match self {
            BookingError::Validation(_) => 400,
            BookingError::Conflict(_) => 409,
            BookingError::Capacity { .. } => 409,
            BookingError::NotFound(_) => 404,
            BookingError::Integrity(_) => 500,
            BookingError::Storage(_) => 500,
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
