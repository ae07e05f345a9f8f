//! SQL implementation of the room store.

use crate::error::DbError;
use crate::repositories::{fmt_ts, parse_ts, store_err};
use crate::DbClient;
use hostelify_booking::models::{Room, RoomType};
use hostelify_booking::store::{RoomStore, StoreError};
use hostelify_common::BoxFuture;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, info};

fn room_type_to_str(room_type: RoomType) -> &'static str {
    match room_type {
        RoomType::Single => "single",
        RoomType::Double => "double",
        RoomType::Triple => "triple",
        RoomType::Quad => "quad",
    }
}

fn room_type_from_str(raw: &str) -> Result<RoomType, StoreError> {
    match raw {
        "single" => Ok(RoomType::Single),
        "double" => Ok(RoomType::Double),
        "triple" => Ok(RoomType::Triple),
        "quad" => Ok(RoomType::Quad),
        other => Err(StoreError::Serialization(format!(
            "unknown room type {:?}",
            other
        ))),
    }
}

fn room_from_row(row: &AnyRow) -> Result<Room, StoreError> {
    Ok(Room {
        id: row.try_get("id").map_err(store_err)?,
        room_number: row.try_get("room_number").map_err(store_err)?,
        capacity: row.try_get::<i64, _>("capacity").map_err(store_err)? as u32,
        room_type: room_type_from_str(&row.try_get::<String, _>("room_type").map_err(store_err)?)?,
        current_occupancy: row
            .try_get::<i64, _>("current_occupancy")
            .map_err(store_err)? as u32,
        is_available: row.try_get::<i64, _>("is_available").map_err(store_err)? != 0,
        created_at: parse_ts(&row.try_get::<String, _>("created_at").map_err(store_err)?)?,
    })
}

/// SQL implementation of the room store
#[derive(Debug, Clone)]
pub struct SqlRoomRepository {
    db_client: DbClient,
}

impl SqlRoomRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing rooms schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS rooms (
                id TEXT PRIMARY KEY,
                room_number TEXT NOT NULL UNIQUE,
                capacity INTEGER NOT NULL,
                room_type TEXT NOT NULL,
                current_occupancy INTEGER NOT NULL DEFAULT 0,
                is_available INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Rooms schema initialized successfully");
        Ok(())
    }
}

impl RoomStore for SqlRoomRepository {
    fn insert(&self, room: Room) -> BoxFuture<'_, Room, StoreError> {
        let pool = self.db_client.pool().clone();
        Box::pin(async move {
            debug!("Inserting room: {}", room.room_number);

            let query = r#"
                INSERT INTO rooms (id, room_number, capacity, room_type, current_occupancy, is_available, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#;

            sqlx::query(query)
                .bind(&room.id)
                .bind(&room.room_number)
                .bind(room.capacity as i64)
                .bind(room_type_to_str(room.room_type))
                .bind(room.current_occupancy as i64)
                .bind(room.is_available as i64)
                .bind(fmt_ts(room.created_at))
                .execute(&pool)
                .await
                .map_err(store_err)?;

            Ok(room)
        })
    }

    fn find(&self, room_id: &str) -> BoxFuture<'_, Option<Room>, StoreError> {
        let pool = self.db_client.pool().clone();
        let room_id = room_id.to_string();
        Box::pin(async move {
            let row = sqlx::query("SELECT * FROM rooms WHERE id = $1")
                .bind(&room_id)
                .fetch_optional(&pool)
                .await
                .map_err(store_err)?;

            row.as_ref().map(room_from_row).transpose()
        })
    }

    fn find_by_number(&self, room_number: &str) -> BoxFuture<'_, Option<Room>, StoreError> {
        let pool = self.db_client.pool().clone();
        let room_number = room_number.to_string();
        Box::pin(async move {
            let row = sqlx::query("SELECT * FROM rooms WHERE room_number = $1")
                .bind(&room_number)
                .fetch_optional(&pool)
                .await
                .map_err(store_err)?;

            row.as_ref().map(room_from_row).transpose()
        })
    }

    fn list(&self) -> BoxFuture<'_, Vec<Room>, StoreError> {
        let pool = self.db_client.pool().clone();
        Box::pin(async move {
            let rows = sqlx::query("SELECT * FROM rooms ORDER BY room_number")
                .fetch_all(&pool)
                .await
                .map_err(store_err)?;

            rows.iter().map(room_from_row).collect()
        })
    }

    fn update_occupancy(
        &self,
        room_id: &str,
        current_occupancy: u32,
        is_available: bool,
    ) -> BoxFuture<'_, (), StoreError> {
        let pool = self.db_client.pool().clone();
        let room_id = room_id.to_string();
        Box::pin(async move {
            debug!(
                "Updating occupancy for room {}: {} (available: {})",
                room_id, current_occupancy, is_available
            );

            let result =
                sqlx::query("UPDATE rooms SET current_occupancy = $1, is_available = $2 WHERE id = $3")
                    .bind(current_occupancy as i64)
                    .bind(is_available as i64)
                    .bind(&room_id)
                    .execute(&pool)
                    .await
                    .map_err(store_err)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::Query(format!("room {} not found", room_id)));
            }
            Ok(())
        })
    }
}
