//! EntityMappingStore implementation for PgStorage.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::postgres::PgRow;
use ztoq_core::{EntityMapping, MappingType};

use super::PgStorage;
use crate::error::StorageError;
use crate::traits::EntityMappingStore;

fn row_to_mapping(row: &PgRow) -> Result<EntityMapping, StorageError> {
    Ok(EntityMapping {
        project_key: row.try_get("project_key")?,
        mapping_type: row.try_get::<String, _>("mapping_type")?.parse::<MappingType>()?,
        source_id: row.try_get("source_id")?,
        target_id: row.try_get("target_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl EntityMappingStore for PgStorage {
    async fn record_mapping(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
        target_id: &str,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "INSERT INTO entity_mappings (project_key, mapping_type, source_id, target_id, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (project_key, mapping_type, source_id) DO NOTHING",
        )
        .bind(project_key)
        .bind(mapping_type.as_str())
        .bind(source_id)
        .bind(target_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_mapping(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
    ) -> Result<Option<EntityMapping>, StorageError> {
        let row = sqlx::query(
            "SELECT project_key, mapping_type, source_id, target_id, created_at
               FROM entity_mappings
              WHERE project_key = $1 AND mapping_type = $2 AND source_id = $3",
        )
        .bind(project_key)
        .bind(mapping_type.as_str())
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_mapping).transpose()
    }

    async fn get_mappings(
        &self,
        project_key: &str,
        mapping_type: Option<MappingType>,
    ) -> Result<Vec<EntityMapping>, StorageError> {
        let rows = sqlx::query(
            "SELECT project_key, mapping_type, source_id, target_id, created_at
               FROM entity_mappings
              WHERE project_key = $1 AND ($2::TEXT IS NULL OR mapping_type = $2)
              ORDER BY id ASC",
        )
        .bind(project_key)
        .bind(mapping_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_mapping).collect()
    }
}
