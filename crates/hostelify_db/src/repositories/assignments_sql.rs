//! SQL implementation of the room assignment store.
//!
//! The unique index over (room_id, student_id, academic_year, semester,
//! status) means a student can hold at most one active and one inactive
//! assignment per room and period; rebooking reactivates the inactive row.

use crate::error::DbError;
use crate::repositories::{assignment_status_from_str, fmt_ts, parse_ts, semester_from_i64, store_err};
use crate::DbClient;
use chrono::{DateTime, Utc};
use hostelify_booking::models::{AssignmentStatus, RoomAssignment, Semester};
use hostelify_booking::store::{AssignmentStore, StoreError};
use hostelify_common::BoxFuture;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, info};

fn assignment_from_row(row: &AnyRow) -> Result<RoomAssignment, StoreError> {
    Ok(RoomAssignment {
        id: row.try_get("id").map_err(store_err)?,
        room_id: row.try_get("room_id").map_err(store_err)?,
        student_id: row.try_get("student_id").map_err(store_err)?,
        booking_id: row.try_get("booking_id").map_err(store_err)?,
        academic_year: row.try_get("academic_year").map_err(store_err)?,
        semester: semester_from_i64(row.try_get::<i64, _>("semester").map_err(store_err)?)?,
        status: assignment_status_from_str(
            &row.try_get::<String, _>("status").map_err(store_err)?,
        )?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at").map_err(store_err)?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at").map_err(store_err)?)?,
    })
}

/// SQL implementation of the room assignment store
#[derive(Debug, Clone)]
pub struct SqlAssignmentRepository {
    db_client: DbClient,
}

impl SqlAssignmentRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing room assignments schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS room_assignments (
                id TEXT PRIMARY KEY,
                room_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                booking_id TEXT,
                academic_year TEXT NOT NULL,
                semester INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(room_id, student_id, academic_year, semester, status)
            )
        "#;
        self.db_client.execute(query).await?;

        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_assignments_room_status ON room_assignments (room_id, status)",
            )
            .await?;

        info!("Room assignments schema initialized successfully");
        Ok(())
    }
}

impl AssignmentStore for SqlAssignmentRepository {
    fn insert(&self, assignment: RoomAssignment) -> BoxFuture<'_, RoomAssignment, StoreError> {
        let pool = self.db_client.pool().clone();
        Box::pin(async move {
            debug!("Inserting assignment: {}", assignment.id);

            let query = r#"
                INSERT INTO room_assignments (id, room_id, student_id, booking_id, academic_year, semester, status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#;

            sqlx::query(query)
                .bind(&assignment.id)
                .bind(&assignment.room_id)
                .bind(&assignment.student_id)
                .bind(&assignment.booking_id)
                .bind(&assignment.academic_year)
                .bind(assignment.semester.number() as i64)
                .bind(assignment.status.as_str())
                .bind(fmt_ts(assignment.created_at))
                .bind(fmt_ts(assignment.updated_at))
                .execute(&pool)
                .await
                .map_err(store_err)?;

            Ok(assignment)
        })
    }

    fn find_for_period(
        &self,
        room_id: &str,
        student_id: &str,
        academic_year: &str,
        semester: Semester,
    ) -> BoxFuture<'_, Vec<RoomAssignment>, StoreError> {
        let pool = self.db_client.pool().clone();
        let room_id = room_id.to_string();
        let student_id = student_id.to_string();
        let academic_year = academic_year.to_string();
        Box::pin(async move {
            let query = r#"
                SELECT * FROM room_assignments
                WHERE room_id = $1 AND student_id = $2 AND academic_year = $3 AND semester = $4
            "#;

            let rows = sqlx::query(query)
                .bind(&room_id)
                .bind(&student_id)
                .bind(&academic_year)
                .bind(semester.number() as i64)
                .fetch_all(&pool)
                .await
                .map_err(store_err)?;

            rows.iter().map(assignment_from_row).collect()
        })
    }

    fn find_by_booking(&self, booking_id: &str) -> BoxFuture<'_, Vec<RoomAssignment>, StoreError> {
        let pool = self.db_client.pool().clone();
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            let rows = sqlx::query("SELECT * FROM room_assignments WHERE booking_id = $1")
                .bind(&booking_id)
                .fetch_all(&pool)
                .await
                .map_err(store_err)?;

            rows.iter().map(assignment_from_row).collect()
        })
    }

    fn find_by_student(&self, student_id: &str) -> BoxFuture<'_, Vec<RoomAssignment>, StoreError> {
        let pool = self.db_client.pool().clone();
        let student_id = student_id.to_string();
        Box::pin(async move {
            let rows = sqlx::query("SELECT * FROM room_assignments WHERE student_id = $1")
                .bind(&student_id)
                .fetch_all(&pool)
                .await
                .map_err(store_err)?;

            rows.iter().map(assignment_from_row).collect()
        })
    }

    fn count_active_for_room(&self, room_id: &str) -> BoxFuture<'_, u32, StoreError> {
        let pool = self.db_client.pool().clone();
        let room_id = room_id.to_string();
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT COUNT(*) AS cnt FROM room_assignments WHERE room_id = $1 AND status = $2",
            )
            .bind(&room_id)
            .bind(AssignmentStatus::Active.as_str())
            .fetch_one(&pool)
            .await
            .map_err(store_err)?;

            let count: i64 = row.try_get("cnt").map_err(store_err)?;
            Ok(count as u32)
        })
    }

    fn set_status(
        &self,
        assignment_id: &str,
        status: AssignmentStatus,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'_, (), StoreError> {
        let pool = self.db_client.pool().clone();
        let assignment_id = assignment_id.to_string();
        Box::pin(async move {
            debug!(
                "Setting assignment {} status to {}",
                assignment_id,
                status.as_str()
            );

            let result = sqlx::query(
                "UPDATE room_assignments SET status = $1, updated_at = $2 WHERE id = $3",
            )
            .bind(status.as_str())
            .bind(fmt_ts(updated_at))
            .bind(&assignment_id)
            .execute(&pool)
            .await
            .map_err(store_err)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::Query(format!(
                    "assignment {} not found",
                    assignment_id
                )));
            }
            Ok(())
        })
    }

    fn reactivate(
        &self,
        assignment_id: &str,
        booking_id: &str,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'_, (), StoreError> {
        let pool = self.db_client.pool().clone();
        let assignment_id = assignment_id.to_string();
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            debug!(
                "Reactivating assignment {} for booking {}",
                assignment_id, booking_id
            );

            let result = sqlx::query(
                "UPDATE room_assignments SET status = $1, booking_id = $2, updated_at = $3 WHERE id = $4",
            )
            .bind(AssignmentStatus::Active.as_str())
            .bind(&booking_id)
            .bind(fmt_ts(updated_at))
            .bind(&assignment_id)
            .execute(&pool)
            .await
            .map_err(store_err)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::Query(format!(
                    "assignment {} not found",
                    assignment_id
                )));
            }
            Ok(())
        })
    }

    fn delete(&self, assignment_id: &str) -> BoxFuture<'_, bool, StoreError> {
        let pool = self.db_client.pool().clone();
        let assignment_id = assignment_id.to_string();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM room_assignments WHERE id = $1")
                .bind(&assignment_id)
                .execute(&pool)
                .await
                .map_err(store_err)?;

            Ok(result.rows_affected() > 0)
        })
    }
}
