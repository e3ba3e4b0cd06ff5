//! MigrationStateStore implementation for PgStorage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use ztoq_core::{MigrationMetadata, MigrationState, MigrationStateUpdate, MigrationStatus};

use super::PgStorage;
use crate::error::StorageError;
use crate::traits::MigrationStateStore;

const SELECT_STATE: &str = "SELECT project_key, extraction_status, transformation_status,
        loading_status, error_message, metadata, created_at, updated_at
   FROM migration_state";

fn row_to_state(row: &PgRow) -> Result<MigrationState, StorageError> {
    let metadata: Json<MigrationMetadata> = row.try_get("metadata")?;
    Ok(MigrationState {
        project_key: row.try_get("project_key")?,
        extraction_status: row.try_get::<String, _>("extraction_status")?.parse::<MigrationStatus>()?,
        transformation_status: row
            .try_get::<String, _>("transformation_status")?
            .parse::<MigrationStatus>()?,
        loading_status: row.try_get::<String, _>("loading_status")?.parse::<MigrationStatus>()?,
        error_message: row.try_get("error_message")?,
        metadata: metadata.0,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl MigrationStateStore for PgStorage {
    async fn get_migration_state(
        &self,
        project_key: &str,
    ) -> Result<Option<MigrationState>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_STATE} WHERE project_key = $1"))
            .bind(project_key)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_state).transpose()
    }

    async fn update_migration_state(
        &self,
        project_key: &str,
        update: MigrationStateUpdate,
    ) -> Result<MigrationState, StorageError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let fresh = MigrationState::new(project_key, now);
        sqlx::query(
            "INSERT INTO migration_state (project_key, metadata, created_at, updated_at)
             VALUES ($1, $2, $3, $3)
             ON CONFLICT (project_key) DO NOTHING",
        )
        .bind(project_key)
        .bind(Json(&fresh.metadata))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(&format!("{SELECT_STATE} WHERE project_key = $1 FOR UPDATE"))
            .bind(project_key)
            .fetch_one(&mut *tx)
            .await?;
        let mut state = row_to_state(&row)?;
        state.apply(update, now);

        sqlx::query(
            "UPDATE migration_state
                SET extraction_status = $2, transformation_status = $3, loading_status = $4,
                    error_message = $5, metadata = $6, updated_at = $7
              WHERE project_key = $1",
        )
        .bind(project_key)
        .bind(state.extraction_status.as_str())
        .bind(state.transformation_status.as_str())
        .bind(state.loading_status.as_str())
        .bind(state.error_message.as_deref())
        .bind(Json(&state.metadata))
        .bind(state.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(state)
    }

    async fn list_migration_states(&self) -> Result<Vec<MigrationState>, StorageError> {
        let rows = sqlx::query(&format!("{SELECT_STATE} ORDER BY project_key"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_state).collect()
    }
}
