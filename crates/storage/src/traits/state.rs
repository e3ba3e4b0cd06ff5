use async_trait::async_trait;
use ztoq_core::{MigrationState, MigrationStateUpdate};

use crate::error::StorageError;

/// Per-project phase status records.
#[async_trait]
pub trait MigrationStateStore: Send + Sync {
    /// Get the state row for a project, if one was ever written.
    async fn get_migration_state(
        &self,
        project_key: &str,
    ) -> Result<Option<MigrationState>, StorageError>;

    /// Create-or-update the project row.
    ///
    /// A missing row is created with every phase `not_started` before the update is
    /// applied. Only supplied fields change; the metadata patch is merged, never a
    /// full replace. The read-modify-write is one transaction.
    async fn update_migration_state(
        &self,
        project_key: &str,
        update: MigrationStateUpdate,
    ) -> Result<MigrationState, StorageError>;

    /// All project rows, ordered by project key.
    async fn list_migration_states(&self) -> Result<Vec<MigrationState>, StorageError>;
}
