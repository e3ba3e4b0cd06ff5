//! EntityBatchStore implementation for PgStorage.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::postgres::PgRow;
use ztoq_core::{EntityBatchState, EntityBatchUpdate, EntityType, MigrationStatus};

use super::{PgStorage, i32_to_u32, u32_to_i32};
use crate::error::StorageError;
use crate::traits::EntityBatchStore;

const SELECT_BATCH: &str = "SELECT project_key, entity_type, batch_number, total_batches,
        items_count, processed_count, status, started_at, completed_at, error_message,
        created_at, updated_at
   FROM entity_batch_state";

fn row_to_batch(row: &PgRow) -> Result<EntityBatchState, StorageError> {
    Ok(EntityBatchState {
        project_key: row.try_get("project_key")?,
        entity_type: row.try_get::<String, _>("entity_type")?.parse::<EntityType>()?,
        batch_number: i32_to_u32(row.try_get("batch_number")?),
        total_batches: i32_to_u32(row.try_get("total_batches")?),
        items_count: i32_to_u32(row.try_get("items_count")?),
        processed_count: i32_to_u32(row.try_get("processed_count")?),
        status: row.try_get::<String, _>("status")?.parse::<MigrationStatus>()?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        error_message: row.try_get("error_message")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl EntityBatchStore for PgStorage {
    async fn create_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
        total_batches: u32,
        items_count: u32,
    ) -> Result<EntityBatchState, StorageError> {
        let batch = EntityBatchState::new(
            project_key,
            entity_type,
            batch_number,
            total_batches,
            items_count,
            Utc::now(),
        );
        let inserted = sqlx::query(
            "INSERT INTO entity_batch_state
               (project_key, entity_type, batch_number, total_batches, items_count,
                processed_count, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, 0, $6, $7, $7)",
        )
        .bind(project_key)
        .bind(entity_type.as_str())
        .bind(u32_to_i32(batch_number))
        .bind(u32_to_i32(total_batches))
        .bind(u32_to_i32(items_count))
        .bind(batch.status.as_str())
        .bind(batch.created_at)
        .execute(&self.pool)
        .await;

        match inserted.map_err(StorageError::from) {
            Ok(_) => Ok(batch),
            Err(e) if e.is_duplicate() => Err(StorageError::DuplicateBatch {
                project_key: project_key.to_owned(),
                entity_type,
                batch_number,
            }),
            Err(e) => Err(e),
        }
    }

    async fn update_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
        update: EntityBatchUpdate,
    ) -> Result<Option<EntityBatchState>, StorageError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "{SELECT_BATCH}
              WHERE project_key = $1 AND entity_type = $2 AND batch_number = $3
              FOR UPDATE"
        ))
        .bind(project_key)
        .bind(entity_type.as_str())
        .bind(u32_to_i32(batch_number))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tracing::warn!(
                project_key,
                entity_type = %entity_type,
                batch_number,
                "update for unknown batch ignored"
            );
            return Ok(None);
        };
        let mut batch = row_to_batch(&row)?;
        batch.apply(update, Utc::now()).map_err(StorageError::InvalidTransition)?;

        sqlx::query(
            "UPDATE entity_batch_state
                SET processed_count = $4, status = $5, started_at = $6, completed_at = $7,
                    error_message = $8, updated_at = $9
              WHERE project_key = $1 AND entity_type = $2 AND batch_number = $3",
        )
        .bind(project_key)
        .bind(entity_type.as_str())
        .bind(u32_to_i32(batch_number))
        .bind(u32_to_i32(batch.processed_count))
        .bind(batch.status.as_str())
        .bind(batch.started_at)
        .bind(batch.completed_at)
        .bind(batch.error_message.as_deref())
        .bind(batch.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(batch))
    }

    async fn get_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
    ) -> Result<Option<EntityBatchState>, StorageError> {
        let row = sqlx::query(&format!(
            "{SELECT_BATCH} WHERE project_key = $1 AND entity_type = $2 AND batch_number = $3"
        ))
        .bind(project_key)
        .bind(entity_type.as_str())
        .bind(u32_to_i32(batch_number))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_batch).transpose()
    }

    async fn get_entity_batches(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityBatchState>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SELECT_BATCH} WHERE project_key = $1 AND entity_type = $2 ORDER BY batch_number ASC"
        ))
        .bind(project_key)
        .bind(entity_type.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_batch).collect()
    }

    async fn get_pending_entity_batches(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityBatchState>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SELECT_BATCH}
              WHERE project_key = $1 AND entity_type = $2 AND status <> 'completed'
              ORDER BY batch_number ASC"
        ))
        .bind(project_key)
        .bind(entity_type.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_batch).collect()
    }
}
