//! Storage backend trait abstraction
//!
//! Defines async domain traits for the state store so the migration engine can run
//! against SQLite, PostgreSQL, or a test double.

pub mod attachment;
pub mod batch;
pub mod mapping;
pub mod staging;
pub mod state;

pub use attachment::AttachmentStore;
pub use batch::EntityBatchStore;
pub use mapping::EntityMappingStore;
pub use staging::StagingStore;
pub use state::MigrationStateStore;

/// Everything the migration engine needs from durable storage.
pub trait StateStore:
    MigrationStateStore + EntityBatchStore + StagingStore + EntityMappingStore + AttachmentStore
{
}

impl<T> StateStore for T where
    T: MigrationStateStore + EntityBatchStore + StagingStore + EntityMappingStore + AttachmentStore
{
}
