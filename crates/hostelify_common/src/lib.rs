// Declare modules within this crate
pub mod error; // Error mapping traits
pub mod logging; // Logging utilities
pub mod services; // Service abstractions

// Re-export error types and utilities for easier access
pub use error::HttpStatusCode;

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level, log_result};

// Re-export service abstractions for easier access
pub use services::{BoxFuture, BoxedError, NotificationResult, NotificationService};
