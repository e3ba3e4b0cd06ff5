use async_trait::async_trait;
use ztoq_core::{EntityBatchState, EntityBatchUpdate, EntityType};

use crate::error::StorageError;

/// Per-entity-type batch checkpoints.
#[async_trait]
pub trait EntityBatchStore: Send + Sync {
    /// Register a batch before any of its items are processed.
    ///
    /// # Errors
    /// [`StorageError::DuplicateBatch`] if the `(project_key, entity_type, batch_number)`
    /// triple already exists. The stored row is left untouched.
    async fn create_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
        total_batches: u32,
        items_count: u32,
    ) -> Result<EntityBatchState, StorageError>;

    /// Apply a partial update; `Ok(None)` if the batch was never created.
    ///
    /// # Errors
    /// [`StorageError::InvalidTransition`] if the status change is not a legal edge,
    /// for example restarting a `completed` batch. The stored row is left untouched.
    async fn update_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
        update: EntityBatchUpdate,
    ) -> Result<Option<EntityBatchState>, StorageError>;

    /// One batch row, if it was ever created.
    async fn get_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
    ) -> Result<Option<EntityBatchState>, StorageError>;

    /// All batches for the entity type, ascending by batch number.
    async fn get_entity_batches(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityBatchState>, StorageError>;

    /// Batches that are `not_started`, `in_progress` or `failed`, ascending by batch number.
    async fn get_pending_entity_batches(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityBatchState>, StorageError>;
}
