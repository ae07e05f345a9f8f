//! Shared error mapping traits.
//!
//! Each crate defines its own `thiserror` enum; this module only carries the
//! glue that lets the request-handling layer turn any of them into an HTTP
//! status without knowing the concrete type.

/// A trait for converting errors to HTTP status codes.
///
/// Implemented by error types so the handler layer can map them to responses
/// consistently.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}
