//! SQL implementation of the booking store.

use crate::error::DbError;
use crate::repositories::{booking_status_from_str, fmt_ts, parse_ts, semester_from_i64, store_err};
use crate::DbClient;
use chrono::{DateTime, Utc};
use hostelify_booking::models::{Booking, BookingStatus};
use hostelify_booking::store::{BookingStore, StoreError};
use hostelify_common::BoxFuture;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, info};

fn booking_from_row(row: &AnyRow) -> Result<Booking, StoreError> {
    Ok(Booking {
        id: row.try_get("id").map_err(store_err)?,
        student_id: row.try_get("student_id").map_err(store_err)?,
        room_id: row.try_get("room_id").map_err(store_err)?,
        booking_date: parse_ts(&row.try_get::<String, _>("booking_date").map_err(store_err)?)?,
        terms_agreed: row.try_get::<i64, _>("terms_agreed").map_err(store_err)? != 0,
        status: booking_status_from_str(&row.try_get::<String, _>("status").map_err(store_err)?)?,
        academic_year: row.try_get("academic_year").map_err(store_err)?,
        semester: semester_from_i64(row.try_get::<i64, _>("semester").map_err(store_err)?)?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at").map_err(store_err)?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at").map_err(store_err)?)?,
    })
}

/// SQL implementation of the booking store
#[derive(Debug, Clone)]
pub struct SqlBookingRepository {
    db_client: DbClient,
}

impl SqlBookingRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing bookings schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                student_id TEXT NOT NULL,
                room_id TEXT NOT NULL,
                booking_date TEXT NOT NULL,
                terms_agreed INTEGER NOT NULL,
                status TEXT NOT NULL,
                academic_year TEXT NOT NULL,
                semester INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;

        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_bookings_student_status ON bookings (student_id, status)",
            )
            .await?;

        info!("Bookings schema initialized successfully");
        Ok(())
    }
}

impl BookingStore for SqlBookingRepository {
    fn insert(&self, booking: Booking) -> BoxFuture<'_, Booking, StoreError> {
        let pool = self.db_client.pool().clone();
        Box::pin(async move {
            debug!("Inserting booking: {}", booking.id);

            let query = r#"
                INSERT INTO bookings (id, student_id, room_id, booking_date, terms_agreed, status, academic_year, semester, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#;

            sqlx::query(query)
                .bind(&booking.id)
                .bind(&booking.student_id)
                .bind(&booking.room_id)
                .bind(fmt_ts(booking.booking_date))
                .bind(booking.terms_agreed as i64)
                .bind(booking.status.as_str())
                .bind(&booking.academic_year)
                .bind(booking.semester.number() as i64)
                .bind(fmt_ts(booking.created_at))
                .bind(fmt_ts(booking.updated_at))
                .execute(&pool)
                .await
                .map_err(store_err)?;

            Ok(booking)
        })
    }

    fn find(&self, booking_id: &str) -> BoxFuture<'_, Option<Booking>, StoreError> {
        let pool = self.db_client.pool().clone();
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            let row = sqlx::query("SELECT * FROM bookings WHERE id = $1")
                .bind(&booking_id)
                .fetch_optional(&pool)
                .await
                .map_err(store_err)?;

            row.as_ref().map(booking_from_row).transpose()
        })
    }

    fn find_active_by_student(
        &self,
        student_id: &str,
    ) -> BoxFuture<'_, Option<Booking>, StoreError> {
        let pool = self.db_client.pool().clone();
        let student_id = student_id.to_string();
        Box::pin(async move {
            let row =
                sqlx::query("SELECT * FROM bookings WHERE student_id = $1 AND status = $2 LIMIT 1")
                    .bind(&student_id)
                    .bind(BookingStatus::Active.as_str())
                    .fetch_optional(&pool)
                    .await
                    .map_err(store_err)?;

            row.as_ref().map(booking_from_row).transpose()
        })
    }

    fn find_by_student(&self, student_id: &str) -> BoxFuture<'_, Vec<Booking>, StoreError> {
        let pool = self.db_client.pool().clone();
        let student_id = student_id.to_string();
        Box::pin(async move {
            let rows = sqlx::query("SELECT * FROM bookings WHERE student_id = $1")
                .bind(&student_id)
                .fetch_all(&pool)
                .await
                .map_err(store_err)?;

            rows.iter().map(booking_from_row).collect()
        })
    }

    fn find_by_status(&self, status: BookingStatus) -> BoxFuture<'_, Vec<Booking>, StoreError> {
        let pool = self.db_client.pool().clone();
        Box::pin(async move {
            let rows = sqlx::query("SELECT * FROM bookings WHERE status = $1")
                .bind(status.as_str())
                .fetch_all(&pool)
                .await
                .map_err(store_err)?;

            rows.iter().map(booking_from_row).collect()
        })
    }

    fn set_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'_, (), StoreError> {
        let pool = self.db_client.pool().clone();
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            debug!("Setting booking {} status to {}", booking_id, status.as_str());

            let result =
                sqlx::query("UPDATE bookings SET status = $1, updated_at = $2 WHERE id = $3")
                    .bind(status.as_str())
                    .bind(fmt_ts(updated_at))
                    .bind(&booking_id)
                    .execute(&pool)
                    .await
                    .map_err(store_err)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::Query(format!(
                    "booking {} not found",
                    booking_id
                )));
            }
            Ok(())
        })
    }

    fn delete(&self, booking_id: &str) -> BoxFuture<'_, bool, StoreError> {
        let pool = self.db_client.pool().clone();
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            debug!("Deleting booking: {}", booking_id);

            let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
                .bind(&booking_id)
                .execute(&pool)
                .await
                .map_err(store_err)?;

            Ok(result.rows_affected() > 0)
        })
    }
}
