//! State store for ztoq migrations
//!
//! Durable migration status, batch checkpoints, staged intermediate records, id
//! mappings and attachment blobs. `SQLite` is the default backend; PostgreSQL is
//! available behind the `postgres` feature.

pub mod backend;
pub mod error;
#[cfg(feature = "sqlite")]
mod migrations;
#[cfg(feature = "postgres")]
mod pg_migrations;
#[cfg(feature = "postgres")]
pub mod pg_storage;
#[cfg(feature = "sqlite")]
mod sqlite_async;
#[cfg(feature = "sqlite")]
mod storage;
#[cfg(all(test, feature = "sqlite"))]
mod tests;
pub mod traits;
pub mod types;

pub use backend::StorageBackend;
pub use error::StorageError;
#[cfg(feature = "postgres")]
pub use pg_storage::PgStorage;
#[cfg(feature = "sqlite")]
pub use storage::Storage;
pub use traits::{
    AttachmentStore, EntityBatchStore, EntityMappingStore, MigrationStateStore, StagingStore,
    StateStore,
};
pub use types::StoredAttachment;
