//! StagingStore implementation for PgStorage.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::postgres::PgRow;
use ztoq_core::{EntityRecord, EntityType, StagedEntity};

use super::PgStorage;
use crate::error::StorageError;
use crate::traits::StagingStore;

fn row_to_staged(row: &PgRow) -> Result<StagedEntity, StorageError> {
    Ok(StagedEntity {
        project_key: row.try_get("project_key")?,
        entity_type: row.try_get::<String, _>("entity_type")?.parse::<EntityType>()?,
        entity_id: row.try_get("entity_id")?,
        payload: row.try_get("payload")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl StagingStore for PgStorage {
    async fn stage_entity(
        &self,
        project_key: &str,
        entity_type: EntityType,
        record: &EntityRecord,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO staged_entities (project_key, entity_type, entity_id, payload, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (project_key, entity_type, entity_id) DO UPDATE SET
                payload = EXCLUDED.payload,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(project_key)
        .bind(entity_type.as_str())
        .bind(&record.entity_id)
        .bind(&record.payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_staged_entities(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<StagedEntity>, StorageError> {
        let rows = sqlx::query(
            "SELECT project_key, entity_type, entity_id, payload, updated_at
               FROM staged_entities
              WHERE project_key = $1 AND entity_type = $2
              ORDER BY seq ASC",
        )
        .bind(project_key)
        .bind(entity_type.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_staged).collect()
    }

    async fn get_staged_entity(
        &self,
        project_key: &str,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Option<StagedEntity>, StorageError> {
        let row = sqlx::query(
            "SELECT project_key, entity_type, entity_id, payload, updated_at
               FROM staged_entities
              WHERE project_key = $1 AND entity_type = $2 AND entity_id = $3",
        )
        .bind(project_key)
        .bind(entity_type.as_str())
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_staged).transpose()
    }
}
