//! Batch executor: runs one batch's items through a phase's item processor.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use ztoq_core::{
    EntityBatchUpdate, EntityRecord, EntityType, MigrationStatus, ResumeGranularity,
    truncate_error_message,
};
use ztoq_storage::{EntityBatchStore, StateStore, StorageError};

use crate::error::MigrationError;

/// Per-item side effect supplied by a phase (extract, transform or load).
///
/// Processors may retry transient failures themselves; an error returned here aborts
/// the rest of the batch.
#[async_trait]
pub trait ItemProcessor: Send + Sync {
    async fn process(
        &self,
        project_key: &str,
        entity_type: EntityType,
        item: &EntityRecord,
    ) -> Result<(), MigrationError>;
}

/// Outcome of one successful [`BatchExecutor::execute_batch`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub batch_number: u32,
    pub processed_count: u32,
    pub status: MigrationStatus,
    /// Items handed to the processor during this call.
    pub items_run: u32,
}

#[derive(Clone)]
pub struct BatchExecutor {
    store: Arc<dyn StateStore>,
    granularity: ResumeGranularity,
}

impl BatchExecutor {
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>, granularity: ResumeGranularity) -> Self {
        Self { store, granularity }
    }

    /// Processes `items` for one registered batch.
    ///
    /// The batch moves to `in_progress`, `processed_count` is written after every item,
    /// and the batch ends `completed`. If the processor fails, the batch is marked
    /// `failed` with the error message, the counter keeps the items that succeeded, and
    /// the error is returned.
    ///
    /// A batch that is already `completed` is left as stored and reported with
    /// `items_run == 0`.
    ///
    /// # Errors
    /// The processor's error, or a storage error; `NotFound` if the batch was never
    /// registered.
    pub async fn execute_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
        items: &[EntityRecord],
        processor: &dyn ItemProcessor,
    ) -> Result<BatchResult, MigrationError> {
        let not_found = || StorageError::NotFound {
            entity: "entity_batch",
            id: format!("{project_key}/{entity_type}/{batch_number}"),
        };
        let stored = self
            .store
            .get_entity_batch(project_key, entity_type, batch_number)
            .await?
            .ok_or_else(not_found)?;
        if stored.status == MigrationStatus::Completed {
            tracing::debug!(
                project_key,
                entity_type = %entity_type,
                batch_number,
                "batch already completed"
            );
            return Ok(BatchResult {
                batch_number,
                processed_count: stored.processed_count,
                status: MigrationStatus::Completed,
                items_run: 0,
            });
        }

        let started = self
            .store
            .update_entity_batch(
                project_key,
                entity_type,
                batch_number,
                EntityBatchUpdate::status(MigrationStatus::InProgress),
            )
            .await?
            .ok_or_else(not_found)?;

        let start = match self.granularity {
            ResumeGranularity::Item => (started.processed_count as usize).min(items.len()),
            ResumeGranularity::Batch => 0,
        };
        tracing::info!(
            project_key,
            entity_type = %entity_type,
            batch_number,
            start,
            items = items.len(),
            "batch started"
        );

        for (idx, item) in items.iter().enumerate().skip(start) {
            tracing::debug!(
                project_key,
                entity_type = %entity_type,
                batch_number,
                entity_id = %item.entity_id,
                "processing item"
            );
            if let Err(e) = processor.process(project_key, entity_type, item).await {
                let message = truncate_error_message(&e.to_string());
                tracing::error!(
                    project_key,
                    entity_type = %entity_type,
                    batch_number,
                    processed = idx,
                    error = %message,
                    "batch failed"
                );
                self.store
                    .update_entity_batch(
                        project_key,
                        entity_type,
                        batch_number,
                        EntityBatchUpdate::failed(to_u32(idx), message),
                    )
                    .await?;
                return Err(e);
            }
            self.store
                .update_entity_batch(
                    project_key,
                    entity_type,
                    batch_number,
                    EntityBatchUpdate::progress(to_u32(idx + 1)),
                )
                .await?;
        }

        let finished = self
            .store
            .update_entity_batch(
                project_key,
                entity_type,
                batch_number,
                EntityBatchUpdate::status(MigrationStatus::Completed),
            )
            .await?;
        let processed_count = finished.map_or(to_u32(items.len()), |b| b.processed_count);
        tracing::info!(
            project_key,
            entity_type = %entity_type,
            batch_number,
            processed = processed_count,
            "batch completed"
        );

        Ok(BatchResult {
            batch_number,
            processed_count,
            status: MigrationStatus::Completed,
            items_run: to_u32(items.len() - start),
        })
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
