use chrono::Utc;
use rusqlite::{OptionalExtension, TransactionBehavior, params};
use ztoq_core::{EntityBatchState, EntityBatchUpdate, EntityType};

use super::{
    Storage, format_timestamp, get_conn, parse_opt_timestamp, parse_text, parse_timestamp,
};
use crate::error::StorageError;

const SELECT_BATCH: &str = "SELECT project_key, entity_type, batch_number, total_batches, items_count,
        processed_count, status, started_at, completed_at, error_message, created_at, updated_at
   FROM entity_batch_state";

fn row_to_batch(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntityBatchState> {
    Ok(EntityBatchState {
        project_key: row.get(0)?,
        entity_type: parse_text(1, &row.get::<_, String>(1)?)?,
        batch_number: row.get(2)?,
        total_batches: row.get(3)?,
        items_count: row.get(4)?,
        processed_count: row.get(5)?,
        status: parse_text(6, &row.get::<_, String>(6)?)?,
        started_at: parse_opt_timestamp(7, row.get(7)?)?,
        completed_at: parse_opt_timestamp(8, row.get(8)?)?,
        error_message: row.get(9)?,
        created_at: parse_timestamp(10, &row.get::<_, String>(10)?)?,
        updated_at: parse_timestamp(11, &row.get::<_, String>(11)?)?,
    })
}

impl Storage {
    /// Register a batch.
    ///
    /// # Errors
    /// Returns [`StorageError::DuplicateBatch`] if the triple already exists.
    pub fn create_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
        total_batches: u32,
        items_count: u32,
    ) -> Result<EntityBatchState, StorageError> {
        let conn = get_conn(&self.pool)?;
        let batch = EntityBatchState::new(
            project_key,
            entity_type,
            batch_number,
            total_batches,
            items_count,
            Utc::now(),
        );
        let inserted = conn.execute(
            "INSERT INTO entity_batch_state
               (project_key, entity_type, batch_number, total_batches, items_count,
                processed_count, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8)",
            params![
                batch.project_key,
                entity_type.as_str(),
                batch_number,
                total_batches,
                items_count,
                batch.status.as_str(),
                format_timestamp(&batch.created_at),
                format_timestamp(&batch.updated_at),
            ],
        );
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

    /// Apply a partial update inside one immediate transaction.
    ///
    /// # Errors
    /// [`StorageError::InvalidTransition`] for a forbidden status change, or any
    /// transaction error; nothing is written in either case.
    pub fn update_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
        update: EntityBatchUpdate,
    ) -> Result<Option<EntityBatchState>, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(mut batch) = tx
            .query_row(
                &format!(
                    "{SELECT_BATCH} WHERE project_key = ?1 AND entity_type = ?2 AND batch_number = ?3"
                ),
                params![project_key, entity_type.as_str(), batch_number],
                row_to_batch,
            )
            .optional()?
        else {
            tracing::warn!(
                project_key,
                entity_type = %entity_type,
                batch_number,
                "update for unknown batch ignored"
            );
            return Ok(None);
        };
        batch.apply(update, Utc::now()).map_err(StorageError::InvalidTransition)?;

        tx.execute(
            "UPDATE entity_batch_state
                SET processed_count = ?1, status = ?2, started_at = ?3, completed_at = ?4,
                    error_message = ?5, updated_at = ?6
              WHERE project_key = ?7 AND entity_type = ?8 AND batch_number = ?9",
            params![
                batch.processed_count,
                batch.status.as_str(),
                batch.started_at.as_ref().map(format_timestamp),
                batch.completed_at.as_ref().map(format_timestamp),
                batch.error_message,
                format_timestamp(&batch.updated_at),
                project_key,
                entity_type.as_str(),
                batch_number,
            ],
        )?;
        tx.commit()?;
        Ok(Some(batch))
    }

    /// One batch row, if it was ever created.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn get_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
    ) -> Result<Option<EntityBatchState>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let batch = conn
            .query_row(
                &format!(
                    "{SELECT_BATCH} WHERE project_key = ?1 AND entity_type = ?2 AND batch_number = ?3"
                ),
                params![project_key, entity_type.as_str(), batch_number],
                row_to_batch,
            )
            .optional()?;
        Ok(batch)
    }

    /// All batches for the entity type, ascending by batch number.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn get_entity_batches(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityBatchState>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_BATCH} WHERE project_key = ?1 AND entity_type = ?2 ORDER BY batch_number ASC"
        ))?;
        let batches = stmt
            .query_map(params![project_key, entity_type.as_str()], row_to_batch)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }

    /// Batches not yet `completed`, ascending by batch number.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn get_pending_entity_batches(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityBatchState>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_BATCH}
              WHERE project_key = ?1 AND entity_type = ?2
                AND status IN ('not_started', 'in_progress', 'failed')
              ORDER BY batch_number ASC"
        ))?;
        let batches = stmt
            .query_map(params![project_key, entity_type.as_str()], row_to_batch)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }
}
