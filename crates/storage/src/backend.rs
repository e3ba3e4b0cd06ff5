//! Unified storage backend with enum dispatch.

use async_trait::async_trait;
use ztoq_core::{
    DatabaseConfig, EntityBatchState, EntityBatchUpdate, EntityMapping, EntityRecord, EntityType,
    MappingType, MigrationState, MigrationStateUpdate, StagedEntity,
};

use crate::error::StorageError;
use crate::traits::{
    AttachmentStore, EntityBatchStore, EntityMappingStore, MigrationStateStore, StagingStore,
};
use crate::types::StoredAttachment;

macro_rules! dispatch {
    ($self:expr, $trait:path, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite(s) => <crate::Storage as $trait>::$method(s, $($arg),*).await,
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(s) => <crate::pg_storage::PgStorage as $trait>::$method(s, $($arg),*).await,
        }
    };
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::Storage),
    #[cfg(feature = "postgres")]
    Postgres(crate::pg_storage::PgStorage),
}

impl StorageBackend {
    #[cfg(feature = "sqlite")]
    pub fn new_sqlite(db_path: &std::path::Path, pool_size: u32) -> Result<Self, StorageError> {
        Ok(Self::Sqlite(crate::Storage::new(db_path, pool_size)?))
    }

    #[cfg(feature = "postgres")]
    pub async fn new_postgres(database_url: &str) -> Result<Self, StorageError> {
        Ok(Self::Postgres(crate::pg_storage::PgStorage::new(database_url).await?))
    }

    /// Open whichever backend the config names.
    ///
    /// # Errors
    /// [`StorageError::Unsupported`] when that backend was not compiled in.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        match config {
            #[cfg(feature = "sqlite")]
            DatabaseConfig::Sqlite { path, pool_size } => Self::new_sqlite(path, *pool_size),
            #[cfg(not(feature = "sqlite"))]
            DatabaseConfig::Sqlite { .. } => {
                Err(StorageError::Unsupported("built without the `sqlite` feature".to_owned()))
            },
            #[cfg(feature = "postgres")]
            DatabaseConfig::Postgres { url } => Self::new_postgres(url).await,
            #[cfg(not(feature = "postgres"))]
            DatabaseConfig::Postgres { .. } => {
                Err(StorageError::Unsupported("built without the `postgres` feature".to_owned()))
            },
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => "postgres",
        }
    }
}

// ── MigrationStateStore ──────────────────────────────────────────

#[async_trait]
impl MigrationStateStore for StorageBackend {
    async fn get_migration_state(
        &self,
        project_key: &str,
    ) -> Result<Option<MigrationState>, StorageError> {
        dispatch!(self, MigrationStateStore, get_migration_state(project_key))
    }

    async fn update_migration_state(
        &self,
        project_key: &str,
        update: MigrationStateUpdate,
    ) -> Result<MigrationState, StorageError> {
        dispatch!(self, MigrationStateStore, update_migration_state(project_key, update))
    }

    async fn list_migration_states(&self) -> Result<Vec<MigrationState>, StorageError> {
        dispatch!(self, MigrationStateStore, list_migration_states())
    }
}

// ── EntityBatchStore ─────────────────────────────────────────────

#[async_trait]
impl EntityBatchStore for StorageBackend {
    async fn create_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
        total_batches: u32,
        items_count: u32,
    ) -> Result<EntityBatchState, StorageError> {
        dispatch!(
            self,
            EntityBatchStore,
            create_entity_batch(project_key, entity_type, batch_number, total_batches, items_count)
        )
    }

    async fn update_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
        update: EntityBatchUpdate,
    ) -> Result<Option<EntityBatchState>, StorageError> {
        dispatch!(
            self,
            EntityBatchStore,
            update_entity_batch(project_key, entity_type, batch_number, update)
        )
    }

    async fn get_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
    ) -> Result<Option<EntityBatchState>, StorageError> {
        dispatch!(self, EntityBatchStore, get_entity_batch(project_key, entity_type, batch_number))
    }

    async fn get_entity_batches(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityBatchState>, StorageError> {
        dispatch!(self, EntityBatchStore, get_entity_batches(project_key, entity_type))
    }

    async fn get_pending_entity_batches(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityBatchState>, StorageError> {
        dispatch!(self, EntityBatchStore, get_pending_entity_batches(project_key, entity_type))
    }
}

// ── StagingStore ─────────────────────────────────────────────────

#[async_trait]
impl StagingStore for StorageBackend {
    async fn stage_entity(
        &self,
        project_key: &str,
        entity_type: EntityType,
        record: &EntityRecord,
    ) -> Result<(), StorageError> {
        dispatch!(self, StagingStore, stage_entity(project_key, entity_type, record))
    }

    async fn get_staged_entities(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<StagedEntity>, StorageError> {
        dispatch!(self, StagingStore, get_staged_entities(project_key, entity_type))
    }

    async fn get_staged_entity(
        &self,
        project_key: &str,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Option<StagedEntity>, StorageError> {
        dispatch!(self, StagingStore, get_staged_entity(project_key, entity_type, entity_id))
    }
}

// ── EntityMappingStore ───────────────────────────────────────────

#[async_trait]
impl EntityMappingStore for StorageBackend {
    async fn record_mapping(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
        target_id: &str,
    ) -> Result<bool, StorageError> {
        dispatch!(
            self,
            EntityMappingStore,
            record_mapping(project_key, mapping_type, source_id, target_id)
        )
    }

    async fn get_mapping(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
    ) -> Result<Option<EntityMapping>, StorageError> {
        dispatch!(self, EntityMappingStore, get_mapping(project_key, mapping_type, source_id))
    }

    async fn get_mappings(
        &self,
        project_key: &str,
        mapping_type: Option<MappingType>,
    ) -> Result<Vec<EntityMapping>, StorageError> {
        dispatch!(self, EntityMappingStore, get_mappings(project_key, mapping_type))
    }
}

// ── AttachmentStore ──────────────────────────────────────────────

#[async_trait]
impl AttachmentStore for StorageBackend {
    async fn save_attachment(
        &self,
        project_key: &str,
        attachment_id: &str,
        filename: &str,
        content_type: Option<&str>,
        content: &[u8],
    ) -> Result<(), StorageError> {
        dispatch!(
            self,
            AttachmentStore,
            save_attachment(project_key, attachment_id, filename, content_type, content)
        )
    }

    async fn get_attachment(
        &self,
        project_key: &str,
        attachment_id: &str,
    ) -> Result<Option<StoredAttachment>, StorageError> {
        dispatch!(self, AttachmentStore, get_attachment(project_key, attachment_id))
    }
}
