use async_trait::async_trait;
use ztoq_core::{EntityMapping, MappingType};

use crate::error::StorageError;

/// Append-only source-to-target id associations.
#[async_trait]
pub trait EntityMappingStore: Send + Sync {
    /// Record a mapping. Returns `false` if one already existed for the source id.
    async fn record_mapping(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
        target_id: &str,
    ) -> Result<bool, StorageError>;

    async fn get_mapping(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
    ) -> Result<Option<EntityMapping>, StorageError>;

    /// Mappings for a project, optionally of one type, in recording order.
    async fn get_mappings(
        &self,
        project_key: &str,
        mapping_type: Option<MappingType>,
    ) -> Result<Vec<EntityMapping>, StorageError>;
}
