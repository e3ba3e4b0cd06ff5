//! Async trait implementations for SQLite `Storage` via `spawn_blocking`.

use async_trait::async_trait;
use ztoq_core::{
    EntityBatchState, EntityBatchUpdate, EntityMapping, EntityRecord, EntityType, MappingType,
    MigrationState, MigrationStateUpdate, StagedEntity,
};

use crate::Storage;
use crate::error::StorageError;
use crate::traits::{
    AttachmentStore, EntityBatchStore, EntityMappingStore, MigrationStateStore, StagingStore,
};
use crate::types::StoredAttachment;

/// Run a blocking closure on the tokio blocking pool.
async fn blocking<F, T>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Blocking(format!("spawn_blocking join error: {e}")))?
}

/// Body-generating macro for async-to-blocking delegation.
///
/// Each argument is annotated with a capture kind:
/// - `@ref arg`: `.clone()` a `&T`, pass as `&arg`
/// - `@str arg`: `.to_owned()` a `&str`, pass as `&arg`
/// - `@opt_str arg`: `.map(ToOwned::to_owned)` an `Option<&str>`, pass as `arg.as_deref()`
/// - `@slice arg`: `.to_vec()` a `&[T]`, pass as `&arg`
/// - `@val arg`: move directly (Copy/owned types)
macro_rules! delegate {
    ($self:ident, $method:ident $(, @$kind:ident $arg:ident)*) => {{
        let s = $self.clone();
        $(delegate!(@capture $kind $arg);)*
        blocking(move || s.$method($(delegate!(@pass $kind $arg)),*)).await
    }};
    (@capture ref $arg:ident) => { let $arg = $arg.clone(); };
    (@capture str $arg:ident) => { let $arg = $arg.to_owned(); };
    (@capture opt_str $arg:ident) => { let $arg = $arg.map(ToOwned::to_owned); };
    (@capture slice $arg:ident) => { let $arg = $arg.to_vec(); };
    (@capture val $arg:ident) => { };
    (@pass ref $arg:ident) => { &$arg };
    (@pass str $arg:ident) => { &$arg };
    (@pass opt_str $arg:ident) => { $arg.as_deref() };
    (@pass slice $arg:ident) => { &$arg };
    (@pass val $arg:ident) => { $arg };
}

// ── MigrationStateStore ──────────────────────────────────────────

#[async_trait]
impl MigrationStateStore for Storage {
    async fn get_migration_state(
        &self,
        project_key: &str,
    ) -> Result<Option<MigrationState>, StorageError> {
        delegate!(self, get_migration_state, @str project_key)
    }
    async fn update_migration_state(
        &self,
        project_key: &str,
        update: MigrationStateUpdate,
    ) -> Result<MigrationState, StorageError> {
        delegate!(self, update_migration_state, @str project_key, @val update)
    }
    async fn list_migration_states(&self) -> Result<Vec<MigrationState>, StorageError> {
        delegate!(self, list_migration_states)
    }
}

// ── EntityBatchStore ─────────────────────────────────────────────

#[async_trait]
impl EntityBatchStore for Storage {
    async fn create_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
        total_batches: u32,
        items_count: u32,
    ) -> Result<EntityBatchState, StorageError> {
        delegate!(
            self,
            create_entity_batch,
            @str project_key,
            @val entity_type,
            @val batch_number,
            @val total_batches,
            @val items_count
        )
    }
    async fn update_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
        update: EntityBatchUpdate,
    ) -> Result<Option<EntityBatchState>, StorageError> {
        delegate!(
            self,
            update_entity_batch,
            @str project_key,
            @val entity_type,
            @val batch_number,
            @val update
        )
    }
    async fn get_entity_batch(
        &self,
        project_key: &str,
        entity_type: EntityType,
        batch_number: u32,
    ) -> Result<Option<EntityBatchState>, StorageError> {
        delegate!(self, get_entity_batch, @str project_key, @val entity_type, @val batch_number)
    }
    async fn get_entity_batches(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityBatchState>, StorageError> {
        delegate!(self, get_entity_batches, @str project_key, @val entity_type)
    }
    async fn get_pending_entity_batches(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityBatchState>, StorageError> {
        delegate!(self, get_pending_entity_batches, @str project_key, @val entity_type)
    }
}

// ── StagingStore ─────────────────────────────────────────────────

#[async_trait]
impl StagingStore for Storage {
    async fn stage_entity(
        &self,
        project_key: &str,
        entity_type: EntityType,
        record: &EntityRecord,
    ) -> Result<(), StorageError> {
        delegate!(self, stage_entity, @str project_key, @val entity_type, @ref record)
    }
    async fn get_staged_entities(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<StagedEntity>, StorageError> {
        delegate!(self, get_staged_entities, @str project_key, @val entity_type)
    }
    async fn get_staged_entity(
        &self,
        project_key: &str,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Option<StagedEntity>, StorageError> {
        delegate!(self, get_staged_entity, @str project_key, @val entity_type, @str entity_id)
    }
}

// ── EntityMappingStore ───────────────────────────────────────────

#[async_trait]
impl EntityMappingStore for Storage {
    async fn record_mapping(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
        target_id: &str,
    ) -> Result<bool, StorageError> {
        delegate!(
            self,
            record_mapping,
            @str project_key,
            @val mapping_type,
            @str source_id,
            @str target_id
        )
    }
    async fn get_mapping(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
    ) -> Result<Option<EntityMapping>, StorageError> {
        delegate!(self, get_mapping, @str project_key, @val mapping_type, @str source_id)
    }
    async fn get_mappings(
        &self,
        project_key: &str,
        mapping_type: Option<MappingType>,
    ) -> Result<Vec<EntityMapping>, StorageError> {
        delegate!(self, get_mappings, @str project_key, @val mapping_type)
    }
}

// ── AttachmentStore ──────────────────────────────────────────────

#[async_trait]
impl AttachmentStore for Storage {
    async fn save_attachment(
        &self,
        project_key: &str,
        attachment_id: &str,
        filename: &str,
        content_type: Option<&str>,
        content: &[u8],
    ) -> Result<(), StorageError> {
        delegate!(
            self,
            save_attachment,
            @str project_key,
            @str attachment_id,
            @str filename,
            @opt_str content_type,
            @slice content
        )
    }
    async fn get_attachment(
        &self,
        project_key: &str,
        attachment_id: &str,
    ) -> Result<Option<StoredAttachment>, StorageError> {
        delegate!(self, get_attachment, @str project_key, @str attachment_id)
    }
}
