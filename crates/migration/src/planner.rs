//! Batch planning: fixed-size slicing plus one checkpoint row per slice.

use std::collections::BTreeMap;

use ztoq_core::{EntityRecord, EntityType, total_batches};
use ztoq_storage::{EntityBatchStore, StateStore, StorageError};

use crate::error::MigrationError;

/// One slice of an entity type's items, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedBatch {
    pub batch_number: u32,
    pub items: Vec<EntityRecord>,
}

/// Slices `items` into `batch_size` chunks and registers a batch row for each.
///
/// On resume the existing rows are kept; their `total_batches` must match the new
/// plan. Missing rows (a crash between creates) are filled in, and a row created by a
/// concurrent planner is accepted as authoritative.
///
/// # Errors
/// [`MigrationError::InvalidInput`] for a zero batch size,
/// [`MigrationError::BatchPlanMismatch`] if stored batches disagree with the plan.
pub async fn plan_batches(
    store: &dyn StateStore,
    project_key: &str,
    entity_type: EntityType,
    items: Vec<EntityRecord>,
    batch_size: usize,
) -> Result<Vec<PlannedBatch>, MigrationError> {
    if batch_size == 0 {
        return Err(MigrationError::InvalidInput("batch_size must be greater than 0".to_owned()));
    }
    let total = u32::try_from(total_batches(items.len(), batch_size)).map_err(|_| {
        MigrationError::InvalidInput(format!("too many batches for {} items", items.len()))
    })?;

    let existing: BTreeMap<u32, u32> = store
        .get_entity_batches(project_key, entity_type)
        .await?
        .into_iter()
        .map(|b| (b.batch_number, b.total_batches))
        .collect();
    if let Some(&stored_total) = existing.values().find(|&&t| t != total) {
        return Err(MigrationError::BatchPlanMismatch {
            entity_type,
            expected: stored_total,
            found: total,
        });
    }

    let mut planned = Vec::with_capacity(total as usize);
    let mut items = items.into_iter();
    for batch_number in 0..total {
        let slice: Vec<EntityRecord> = items.by_ref().take(batch_size).collect();
        if !existing.contains_key(&batch_number) {
            let items_count = u32::try_from(slice.len()).unwrap_or(u32::MAX);
            match store
                .create_entity_batch(project_key, entity_type, batch_number, total, items_count)
                .await
            {
                Ok(_) => {},
                Err(StorageError::DuplicateBatch { .. }) => {
                    tracing::warn!(
                        project_key,
                        entity_type = %entity_type,
                        batch_number,
                        "batch already registered, keeping stored row"
                    );
                },
                Err(e) => return Err(e.into()),
            }
        }
        planned.push(PlannedBatch { batch_number, items: slice });
    }

    tracing::info!(
        project_key,
        entity_type = %entity_type,
        total_batches = total,
        resumed = !existing.is_empty(),
        "batches planned"
    );
    Ok(planned)
}
