use async_trait::async_trait;
use ztoq_core::{EntityRecord, EntityType, StagedEntity};

use crate::error::StorageError;

/// Intermediate records handed from one phase to the next.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Insert or overwrite the record with the same `entity_id`.
    async fn stage_entity(
        &self,
        project_key: &str,
        entity_type: EntityType,
        record: &EntityRecord,
    ) -> Result<(), StorageError>;

    /// Staged records in first-insertion order.
    async fn get_staged_entities(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<StagedEntity>, StorageError>;

    async fn get_staged_entity(
        &self,
        project_key: &str,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Option<StagedEntity>, StorageError>;
}
