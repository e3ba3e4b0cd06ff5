//! Per-phase fetchers and item processors.
//!
//! Each phase type implements both [`EntityFetcher`](crate::controller::EntityFetcher)
//! and [`ItemProcessor`](crate::executor::ItemProcessor). Entity ids are the Zephyr
//! numeric id rendered as a string in every phase, so a record can be followed from
//! extraction to loading.

mod extract;
mod load;
mod transform;

pub use extract::{AttachmentRef, ExtractPhase};
pub use load::LoadPhase;
pub use transform::TransformPhase;

use ztoq_core::{EntityRecord, EntityType};
use ztoq_storage::{StagingStore, StateStore};

use crate::error::MigrationError;

/// Staged records of `entity_type`'s input type, in staging order.
pub(crate) async fn staged_input(
    store: &dyn StateStore,
    project_key: &str,
    entity_type: EntityType,
) -> Result<Vec<EntityRecord>, MigrationError> {
    let Some(input) = entity_type.input() else {
        return Err(MigrationError::InvalidInput(format!("{entity_type} has no staged input")));
    };
    let staged = store.get_staged_entities(project_key, input).await?;
    Ok(staged.into_iter().map(EntityRecord::from).collect())
}

pub(crate) fn wrong_phase(entity_type: EntityType) -> MigrationError {
    MigrationError::InvalidInput(format!(
        "{entity_type} belongs to the {} phase",
        entity_type.phase()
    ))
}
