use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use ztoq_core::{EntityRecord, EntityType, StagedEntity};

use super::{Storage, format_timestamp, get_conn, parse_json, parse_text, parse_timestamp};
use crate::error::StorageError;

fn row_to_staged(row: &rusqlite::Row<'_>) -> rusqlite::Result<StagedEntity> {
    Ok(StagedEntity {
        project_key: row.get(0)?,
        entity_type: parse_text(1, &row.get::<_, String>(1)?)?,
        entity_id: row.get(2)?,
        payload: parse_json(3, &row.get::<_, String>(3)?)?,
        updated_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
    })
}

impl Storage {
    /// Insert or overwrite a staged record; the original insertion position is kept.
    ///
    /// # Errors
    /// Returns error if database upsert fails.
    pub fn stage_entity(
        &self,
        project_key: &str,
        entity_type: EntityType,
        record: &EntityRecord,
    ) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO staged_entities (project_key, entity_type, entity_id, payload, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(project_key, entity_type, entity_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at",
            params![
                project_key,
                entity_type.as_str(),
                record.entity_id,
                serde_json::to_string(&record.payload)?,
                format_timestamp(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Staged records in first-insertion order.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn get_staged_entities(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<StagedEntity>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(
            "SELECT project_key, entity_type, entity_id, payload, updated_at
               FROM staged_entities
              WHERE project_key = ?1 AND entity_type = ?2
              ORDER BY seq ASC",
        )?;
        let staged = stmt
            .query_map(params![project_key, entity_type.as_str()], row_to_staged)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(staged)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_staged_entity(
        &self,
        project_key: &str,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Option<StagedEntity>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let staged = conn
            .query_row(
                "SELECT project_key, entity_type, entity_id, payload, updated_at
                   FROM staged_entities
                  WHERE project_key = ?1 AND entity_type = ?2 AND entity_id = ?3",
                params![project_key, entity_type.as_str(), entity_id],
                row_to_staged,
            )
            .optional()?;
        Ok(staged)
    }
}
