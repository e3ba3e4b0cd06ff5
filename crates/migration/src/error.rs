//! Typed error enum for the migration engine.
//!
//! Unifies state store, source and target failures so the phase controller can
//! persist one message and re-raise the original error.

use thiserror::Error;
use ztoq_core::{CoreError, EntityType, MappingType, Phase};
use ztoq_storage::StorageError;

#[derive(Debug, Error)]
pub enum MigrationError {
    /// State store operation failed.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Source system call failed (after the client's own retries).
    #[error("source: {0}")]
    Source(#[source] anyhow::Error),

    /// Target system call failed (after the client's own retries).
    #[error("target: {0}")]
    Target(#[source] anyhow::Error),

    /// A source record could not be mapped to its target shape.
    #[error("transform: {0}")]
    Transform(String),

    /// A staged payload did not decode into the expected record.
    #[error("payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Existing batches were planned with a different batch count.
    #[error("batch plan mismatch for {entity_type}: stored {expected} batches, planned {found}")]
    BatchPlanMismatch { entity_type: EntityType, expected: u32, found: u32 },

    /// A phase was requested before the phase it consumes completed.
    #[error("cannot run {phase} before {requires} has completed")]
    PhaseOrder { phase: Phase, requires: Phase },

    /// Illegal phase status transition.
    #[error("state: {0}")]
    State(#[from] CoreError),

    #[error("no {mapping_type} mapping for source id {source_id}")]
    MissingMapping { mapping_type: MappingType, source_id: String },

    #[error("{entity_type} record {entity_id} was never staged")]
    MissingStaged { entity_type: EntityType, entity_id: String },

    /// Batches still pending after every planned batch ran.
    #[error("{pending} batches of {entity_type} are not completed")]
    IncompleteBatches { entity_type: EntityType, pending: usize },

    /// A batch worker task panicked or was cancelled.
    #[error("worker: {0}")]
    Worker(String),
}

impl MigrationError {
    /// Whether this error is likely transient (worth re-running the migration).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Source(_) | Self::Target(_) | Self::Worker(_) => true,
            _ => false,
        }
    }
}
