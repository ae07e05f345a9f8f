//! Database integration for Hostelify
//!
//! This crate provides a database client that is designed to be database agnostic,
//! using SQLx as the underlying database library, plus SQL implementations of
//! the booking storage traits. It supports SQLite, PostgreSQL, and MySQL
//! databases through feature flags.
//!
//! # Example
//!
//! ```rust,no_run
//! use hostelify_config::AppConfig;
//! use hostelify_db::DbClient;
//! use std::sync::Arc;
//!
//! async fn setup_db() -> Result<DbClient, Box<dyn std::error::Error>> {
//!     let config = Arc::new(AppConfig::default());
//!     let db_client = DbClient::new(&config).await?;
//!     Ok(db_client)
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;

// Register the SQLite driver when the crate is loaded
#[cfg(feature = "sqlite")]
mod sqlite_driver {
    // This import ensures the SQLite driver is linked and registered
    #[allow(unused_imports)]
    use sqlx::sqlite::SqlitePoolOptions as _;
}

pub use client::DbClient;
pub use error::DbError;

pub use repositories::{
    SqlArchiveRepository, SqlAssignmentRepository, SqlBookingRepository, SqlRoomRepository,
    SqlSettingsRepository, SqlStudentRepository,
};
