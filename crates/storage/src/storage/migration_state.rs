use chrono::Utc;
use rusqlite::{OptionalExtension, TransactionBehavior, params};
use ztoq_core::{MigrationMetadata, MigrationState, MigrationStateUpdate};

use super::{Storage, format_timestamp, get_conn, parse_json, parse_text, parse_timestamp};
use crate::error::StorageError;

const SELECT_STATE: &str = "SELECT project_key, extraction_status, transformation_status, loading_status,
        error_message, metadata, created_at, updated_at
   FROM migration_state";

fn row_to_state(row: &rusqlite::Row<'_>) -> rusqlite::Result<MigrationState> {
    Ok(MigrationState {
        project_key: row.get(0)?,
        extraction_status: parse_text(1, &row.get::<_, String>(1)?)?,
        transformation_status: parse_text(2, &row.get::<_, String>(2)?)?,
        loading_status: parse_text(3, &row.get::<_, String>(3)?)?,
        error_message: row.get(4)?,
        metadata: parse_json::<MigrationMetadata>(5, &row.get::<_, String>(5)?)?,
        created_at: parse_timestamp(6, &row.get::<_, String>(6)?)?,
        updated_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
    })
}

impl Storage {
    /// Get the state row for a project.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn get_migration_state(
        &self,
        project_key: &str,
    ) -> Result<Option<MigrationState>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let state = conn
            .query_row(
                &format!("{SELECT_STATE} WHERE project_key = ?1"),
                params![project_key],
                row_to_state,
            )
            .optional()?;
        Ok(state)
    }

    /// Create-or-update the project row inside one immediate transaction.
    ///
    /// # Errors
    /// Returns error if the transaction fails; nothing is written in that case.
    pub fn update_migration_state(
        &self,
        project_key: &str,
        update: MigrationStateUpdate,
    ) -> Result<MigrationState, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = Utc::now();

        let mut state = tx
            .query_row(
                &format!("{SELECT_STATE} WHERE project_key = ?1"),
                params![project_key],
                row_to_state,
            )
            .optional()?
            .unwrap_or_else(|| MigrationState::new(project_key, now));
        state.apply(update, now);

        tx.execute(
            "INSERT INTO migration_state
               (project_key, extraction_status, transformation_status, loading_status,
                error_message, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(project_key) DO UPDATE SET
                extraction_status = excluded.extraction_status,
                transformation_status = excluded.transformation_status,
                loading_status = excluded.loading_status,
                error_message = excluded.error_message,
                metadata = excluded.metadata,
                updated_at = excluded.updated_at",
            params![
                state.project_key,
                state.extraction_status.as_str(),
                state.transformation_status.as_str(),
                state.loading_status.as_str(),
                state.error_message,
                serde_json::to_string(&state.metadata)?,
                format_timestamp(&state.created_at),
                format_timestamp(&state.updated_at),
            ],
        )?;
        tx.commit()?;
        Ok(state)
    }

    /// All project rows, ordered by project key.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn list_migration_states(&self) -> Result<Vec<MigrationState>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(&format!("{SELECT_STATE} ORDER BY project_key"))?;
        let states = stmt.query_map([], row_to_state)?.collect::<Result<Vec<_>, _>>()?;
        Ok(states)
    }
}
