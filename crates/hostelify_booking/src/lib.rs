// Declare modules within this crate
pub mod academic;
pub mod deletion;
pub mod error;
pub mod events;
pub mod handlers;
pub mod lifecycle;
#[cfg(test)]
mod lifecycle_test;
pub mod locks;
#[cfg(test)]
pub(crate) mod memory;
pub mod models;
pub mod occupancy;
pub mod routes;
pub mod store;
pub mod window;

// Re-export the routes function to be used by the main backend service
pub use routes::routes;

pub use error::BookingError;
pub use events::{DomainEvent, EventBus};
