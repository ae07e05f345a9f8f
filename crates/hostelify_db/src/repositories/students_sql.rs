//! SQL implementation of the student store.

use crate::error::DbError;
use crate::repositories::{fmt_ts, parse_ts, store_err};
use crate::DbClient;
use hostelify_booking::models::Student;
use hostelify_booking::store::{StoreError, StudentStore};
use hostelify_common::BoxFuture;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, info};

fn student_from_row(row: &AnyRow) -> Result<Student, StoreError> {
    Ok(Student {
        id: row.try_get("id").map_err(store_err)?,
        full_name: row.try_get("full_name").map_err(store_err)?,
        email: row.try_get("email").map_err(store_err)?,
        phone: row.try_get("phone").map_err(store_err)?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at").map_err(store_err)?)?,
    })
}

/// SQL implementation of the student store
#[derive(Debug, Clone)]
pub struct SqlStudentRepository {
    db_client: DbClient,
}

impl SqlStudentRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing students schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                created_at TEXT NOT NULL
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Students schema initialized successfully");
        Ok(())
    }
}

impl StudentStore for SqlStudentRepository {
    fn insert(&self, student: Student) -> BoxFuture<'_, Student, StoreError> {
        let pool = self.db_client.pool().clone();
        Box::pin(async move {
            debug!("Inserting student: {}", student.id);

            let query = r#"
                INSERT INTO students (id, full_name, email, phone, created_at)
                VALUES ($1, $2, $3, $4, $5)
            "#;

            sqlx::query(query)
                .bind(&student.id)
                .bind(&student.full_name)
                .bind(&student.email)
                .bind(&student.phone)
                .bind(fmt_ts(student.created_at))
                .execute(&pool)
                .await
                .map_err(store_err)?;

            Ok(student)
        })
    }

    fn find(&self, student_id: &str) -> BoxFuture<'_, Option<Student>, StoreError> {
        let pool = self.db_client.pool().clone();
        let student_id = student_id.to_string();
        Box::pin(async move {
            let row = sqlx::query("SELECT * FROM students WHERE id = $1")
                .bind(&student_id)
                .fetch_optional(&pool)
                .await
                .map_err(store_err)?;

            row.as_ref().map(student_from_row).transpose()
        })
    }

    fn delete(&self, student_id: &str) -> BoxFuture<'_, bool, StoreError> {
        let pool = self.db_client.pool().clone();
        let student_id = student_id.to_string();
        Box::pin(async move {
            debug!("Deleting student: {}", student_id);

            let result = sqlx::query("DELETE FROM students WHERE id = $1")
                .bind(&student_id)
                .execute(&pool)
                .await
                .map_err(store_err)?;

            Ok(result.rows_affected() > 0)
        })
    }
}
