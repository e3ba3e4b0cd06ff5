//! Read-only commands over the state store.

use anyhow::{Result, bail};
use serde::Serialize;
use ztoq_core::{EntityBatchState, EntityType, MappingType, MigrationStatus};
use ztoq_storage::{EntityBatchStore, EntityMappingStore, MigrationStateStore};

use crate::{ConfigOverrides, load_config, open_store};

#[derive(Serialize)]
struct BatchSummary {
    entity_type: EntityType,
    total_batches: usize,
    completed: usize,
    failed: usize,
    items: u64,
    processed: u64,
    batches: Vec<EntityBatchState>,
}

fn summarize(entity_type: EntityType, batches: Vec<EntityBatchState>) -> BatchSummary {
    BatchSummary {
        entity_type,
        total_batches: batches.len(),
        completed: batches.iter().filter(|b| !b.is_pending()).count(),
        failed: batches.iter().filter(|b| b.status == MigrationStatus::Failed).count(),
        items: batches.iter().map(|b| u64::from(b.items_count)).sum(),
        processed: batches.iter().map(|b| u64::from(b.processed_count)).sum(),
        batches,
    }
}

pub(crate) async fn run_status(database_url: Option<String>, project: Option<&str>) -> Result<()> {
    let config = load_config(ConfigOverrides { database_url, ..ConfigOverrides::default() })?;
    let store = open_store(&config).await?;
    match project {
        Some(key) => match store.get_migration_state(key).await? {
            Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
            None => bail!("no migration state for project {key}"),
        },
        None => {
            let states = store.list_migration_states().await?;
            println!("{}", serde_json::to_string_pretty(&states)?);
        },
    }
    Ok(())
}

pub(crate) async fn run_batches(
    database_url: Option<String>,
    project: &str,
    entity_type: Option<EntityType>,
) -> Result<()> {
    let config = load_config(ConfigOverrides { database_url, ..ConfigOverrides::default() })?;
    let store = open_store(&config).await?;
    let mut summaries = Vec::new();
    if let Some(entity_type) = entity_type {
        let batches = store.get_entity_batches(project, entity_type).await?;
        summaries.push(summarize(entity_type, batches));
    } else {
        // Without a filter, only entity types that were planned are listed.
        for entity_type in EntityType::ALL {
            let batches = store.get_entity_batches(project, entity_type).await?;
            if !batches.is_empty() {
                summaries.push(summarize(entity_type, batches));
            }
        }
    }
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}

pub(crate) async fn run_mappings(
    database_url: Option<String>,
    project: &str,
    mapping_type: Option<MappingType>,
) -> Result<()> {
    let config = load_config(ConfigOverrides { database_url, ..ConfigOverrides::default() })?;
    let store = open_store(&config).await?;
    let mappings = store.get_mappings(project, mapping_type).await?;
    println!("{}", serde_json::to_string_pretty(&mappings)?);
    Ok(())
}
