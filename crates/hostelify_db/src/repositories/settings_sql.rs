//! SQL implementation of the settings store.
//!
//! Settings are singleton JSON documents in a key/value table, written with
//! upsert semantics under the well-known keys.

use crate::error::DbError;
use crate::repositories::{fmt_ts, store_err};
use crate::DbClient;
use chrono::Utc;
use hostelify_booking::models::{AcademicSettings, PortalSettings};
use hostelify_booking::store::{
    SettingsStore, StoreError, ACADEMIC_SETTINGS_KEY, PORTAL_SETTINGS_KEY,
};
use hostelify_common::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::Row;
use tracing::{debug, info};

/// SQL implementation of the settings store
#[derive(Debug, Clone)]
pub struct SqlSettingsRepository {
    db_client: DbClient,
}

impl SqlSettingsRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing settings schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS app_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;

        info!("Settings schema initialized successfully");
        Ok(())
    }

    fn fetch<T>(&self, key: &'static str) -> BoxFuture<'static, Option<T>, StoreError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let pool = self.db_client.pool().clone();
        Box::pin(async move {
            let row = sqlx::query("SELECT value FROM app_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&pool)
                .await
                .map_err(store_err)?;

            match row {
                Some(row) => {
                    let raw: String = row.try_get("value").map_err(store_err)?;
                    let parsed = serde_json::from_str(&raw)
                        .map_err(|e| StoreError::Serialization(e.to_string()))?;
                    Ok(Some(parsed))
                }
                None => Ok(None),
            }
        })
    }

    fn upsert<T>(&self, key: &'static str, settings: &T) -> BoxFuture<'static, (), StoreError>
    where
        T: Serialize,
    {
        let pool = self.db_client.pool().clone();
        let encoded = serde_json::to_string(settings);
        Box::pin(async move {
            debug!("Saving settings document: {}", key);

            let value = encoded.map_err(|e| StoreError::Serialization(e.to_string()))?;
            let query = r#"
                INSERT INTO app_settings (key, value, updated_at)
                VALUES ($1, $2, $3)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#;

            sqlx::query(query)
                .bind(key)
                .bind(value)
                .bind(fmt_ts(Utc::now()))
                .execute(&pool)
                .await
                .map_err(store_err)?;
            Ok(())
        })
    }
}

impl SettingsStore for SqlSettingsRepository {
    fn portal(&self) -> BoxFuture<'_, Option<PortalSettings>, StoreError> {
        self.fetch(PORTAL_SETTINGS_KEY)
    }

    fn save_portal(&self, settings: PortalSettings) -> BoxFuture<'_, (), StoreError> {
        self.upsert(PORTAL_SETTINGS_KEY, &settings)
    }

    fn academic(&self) -> BoxFuture<'_, Option<AcademicSettings>, StoreError> {
        self.fetch(ACADEMIC_SETTINGS_KEY)
    }

    fn save_academic(&self, settings: AcademicSettings) -> BoxFuture<'_, (), StoreError> {
        self.upsert(ACADEMIC_SETTINGS_KEY, &settings)
    }
}
