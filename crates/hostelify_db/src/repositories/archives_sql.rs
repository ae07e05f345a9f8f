//! SQL implementation of the booking archive store.
//!
//! Archives are insert-only; the unique index on original_booking_id keeps
//! one snapshot per booking.

use crate::error::DbError;
use crate::repositories::{booking_status_from_str, fmt_ts, parse_ts, semester_from_i64, store_err};
use crate::DbClient;
use hostelify_booking::models::BookingArchive;
use hostelify_booking::store::{ArchiveFilter, ArchiveStore, StoreError};
use hostelify_common::BoxFuture;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, info};

fn archive_from_row(row: &AnyRow) -> Result<BookingArchive, StoreError> {
    Ok(BookingArchive {
        id: row.try_get("id").map_err(store_err)?,
        original_booking_id: row.try_get("original_booking_id").map_err(store_err)?,
        student_id: row.try_get("student_id").map_err(store_err)?,
        room_id: row.try_get("room_id").map_err(store_err)?,
        room_number: row.try_get("room_number").map_err(store_err)?,
        booking_date: parse_ts(&row.try_get::<String, _>("booking_date").map_err(store_err)?)?,
        academic_year: row.try_get("academic_year").map_err(store_err)?,
        semester: semester_from_i64(row.try_get::<i64, _>("semester").map_err(store_err)?)?,
        original_status: booking_status_from_str(
            &row.try_get::<String, _>("original_status").map_err(store_err)?,
        )?,
        original_created_at: parse_ts(
            &row.try_get::<String, _>("original_created_at")
                .map_err(store_err)?,
        )?,
        original_updated_at: parse_ts(
            &row.try_get::<String, _>("original_updated_at")
                .map_err(store_err)?,
        )?,
        archived_at: parse_ts(&row.try_get::<String, _>("archived_at").map_err(store_err)?)?,
        archived_by: row.try_get("archived_by").map_err(store_err)?,
    })
}

/// SQL implementation of the booking archive store
#[derive(Debug, Clone)]
pub struct SqlArchiveRepository {
    db_client: DbClient,
}

impl SqlArchiveRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking archives schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS booking_archives (
                id TEXT PRIMARY KEY,
                original_booking_id TEXT NOT NULL UNIQUE,
                student_id TEXT NOT NULL,
                room_id TEXT NOT NULL,
                room_number TEXT NOT NULL,
                booking_date TEXT NOT NULL,
                academic_year TEXT NOT NULL,
                semester INTEGER NOT NULL,
                original_status TEXT NOT NULL,
                original_created_at TEXT NOT NULL,
                original_updated_at TEXT NOT NULL,
                archived_at TEXT NOT NULL,
                archived_by TEXT
            )
        "#;
        self.db_client.execute(query).await?;

        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_archives_student ON booking_archives (student_id)",
            )
            .await?;

        info!("Booking archives schema initialized successfully");
        Ok(())
    }
}

impl ArchiveStore for SqlArchiveRepository {
    fn insert(&self, archive: BookingArchive) -> BoxFuture<'_, BookingArchive, StoreError> {
        let pool = self.db_client.pool().clone();
        Box::pin(async move {
            debug!(
                "Inserting archive {} for booking {}",
                archive.id, archive.original_booking_id
            );

            let query = r#"
                INSERT INTO booking_archives (
                    id, original_booking_id, student_id, room_id, room_number,
                    booking_date, academic_year, semester, original_status,
                    original_created_at, original_updated_at, archived_at, archived_by
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#;

            sqlx::query(query)
                .bind(&archive.id)
                .bind(&archive.original_booking_id)
                .bind(&archive.student_id)
                .bind(&archive.room_id)
                .bind(&archive.room_number)
                .bind(fmt_ts(archive.booking_date))
                .bind(&archive.academic_year)
                .bind(archive.semester.number() as i64)
                .bind(archive.original_status.as_str())
                .bind(fmt_ts(archive.original_created_at))
                .bind(fmt_ts(archive.original_updated_at))
                .bind(fmt_ts(archive.archived_at))
                .bind(&archive.archived_by)
                .execute(&pool)
                .await
                .map_err(store_err)?;

            Ok(archive)
        })
    }

    fn find_by_original(
        &self,
        original_booking_id: &str,
    ) -> BoxFuture<'_, Option<BookingArchive>, StoreError> {
        let pool = self.db_client.pool().clone();
        let original_booking_id = original_booking_id.to_string();
        Box::pin(async move {
            let row = sqlx::query("SELECT * FROM booking_archives WHERE original_booking_id = $1")
                .bind(&original_booking_id)
                .fetch_optional(&pool)
                .await
                .map_err(store_err)?;

            row.as_ref().map(archive_from_row).transpose()
        })
    }

    fn list_for_student(
        &self,
        student_id: &str,
        filter: ArchiveFilter,
    ) -> BoxFuture<'_, (Vec<BookingArchive>, u64), StoreError> {
        let pool = self.db_client.pool().clone();
        let student_id = student_id.to_string();
        Box::pin(async move {
            let mut conditions = vec!["student_id = $1".to_string()];
            let mut next_param = 2;
            if filter.academic_year.is_some() {
                conditions.push(format!("academic_year = ${}", next_param));
                next_param += 1;
            }
            if filter.semester.is_some() {
                conditions.push(format!("semester = ${}", next_param));
            }
            let where_clause = conditions.join(" AND ");

            let count_sql = format!(
                "SELECT COUNT(*) AS cnt FROM booking_archives WHERE {}",
                where_clause
            );
            let mut count_query = sqlx::query(&count_sql).bind(&student_id);
            if let Some(year) = &filter.academic_year {
                count_query = count_query.bind(year);
            }
            if let Some(semester) = filter.semester {
                count_query = count_query.bind(semester.number() as i64);
            }
            let count_row = count_query.fetch_one(&pool).await.map_err(store_err)?;
            let total: i64 = count_row.try_get("cnt").map_err(store_err)?;

            // Offset math in u64; a huge caller-supplied page must not overflow
            let page = filter.page.max(1) as u64;
            let offset = (page - 1) * filter.limit as u64;
            let page_sql = format!(
                "SELECT * FROM booking_archives WHERE {} \
                 ORDER BY academic_year DESC, semester DESC, archived_at DESC \
                 LIMIT {} OFFSET {}",
                where_clause, filter.limit, offset
            );
            let mut page_query = sqlx::query(&page_sql).bind(&student_id);
            if let Some(year) = &filter.academic_year {
                page_query = page_query.bind(year);
            }
            if let Some(semester) = filter.semester {
                page_query = page_query.bind(semester.number() as i64);
            }
            let rows = page_query.fetch_all(&pool).await.map_err(store_err)?;

            let archives: Result<Vec<_>, _> = rows.iter().map(archive_from_row).collect();
            Ok((archives?, total as u64))
        })
    }
}
