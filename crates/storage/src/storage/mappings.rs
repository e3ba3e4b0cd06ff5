use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use ztoq_core::{EntityMapping, MappingType};

use super::{Storage, format_timestamp, get_conn, parse_text, parse_timestamp};
use crate::error::StorageError;

fn row_to_mapping(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntityMapping> {
    Ok(EntityMapping {
        project_key: row.get(0)?,
        mapping_type: parse_text(1, &row.get::<_, String>(1)?)?,
        source_id: row.get(2)?,
        target_id: row.get(3)?,
        created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
    })
}

impl Storage {
    /// Record a mapping; an existing mapping for the same source id is kept.
    ///
    /// # Errors
    /// Returns error if database insert fails.
    pub fn record_mapping(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
        target_id: &str,
    ) -> Result<bool, StorageError> {
        let conn = get_conn(&self.pool)?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO entity_mappings
               (project_key, mapping_type, source_id, target_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project_key,
                mapping_type.as_str(),
                source_id,
                target_id,
                format_timestamp(&Utc::now()),
            ],
        )?;
        Ok(inserted > 0)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_mapping(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
    ) -> Result<Option<EntityMapping>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mapping = conn
            .query_row(
                "SELECT project_key, mapping_type, source_id, target_id, created_at
                   FROM entity_mappings
                  WHERE project_key = ?1 AND mapping_type = ?2 AND source_id = ?3",
                params![project_key, mapping_type.as_str(), source_id],
                row_to_mapping,
            )
            .optional()?;
        Ok(mapping)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_mappings(
        &self,
        project_key: &str,
        mapping_type: Option<MappingType>,
    ) -> Result<Vec<EntityMapping>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(
            "SELECT project_key, mapping_type, source_id, target_id, created_at
               FROM entity_mappings
              WHERE project_key = ?1 AND (?2 IS NULL OR mapping_type = ?2)
              ORDER BY id ASC",
        )?;
        let mappings = stmt
            .query_map(params![project_key, mapping_type.map(|t| t.as_str())], row_to_mapping)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(mappings)
    }
}
