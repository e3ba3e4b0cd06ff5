use std::sync::Arc;

use async_trait::async_trait;
use ztoq_core::{EntityRecord, EntityType, ZephyrTestCase, ZephyrTestCycle, ZephyrTestExecution};
use ztoq_storage::{StagingStore, StateStore};

use super::{staged_input, wrong_phase};
use crate::controller::EntityFetcher;
use crate::error::MigrationError;
use crate::executor::ItemProcessor;
use crate::transform::{transform_test_case, transform_test_cycle, transform_test_execution};

/// Reshapes staged Zephyr records into staged qTest records.
pub struct TransformPhase {
    store: Arc<dyn StateStore>,
}

impl TransformPhase {
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EntityFetcher for TransformPhase {
    async fn fetch(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityRecord>, MigrationError> {
        staged_input(self.store.as_ref(), project_key, entity_type).await
    }
}

#[async_trait]
impl ItemProcessor for TransformPhase {
    async fn process(
        &self,
        project_key: &str,
        entity_type: EntityType,
        item: &EntityRecord,
    ) -> Result<(), MigrationError> {
        let id = item.entity_id.clone();
        let record = match entity_type {
            EntityType::TransformedTestCases => {
                EntityRecord::from_value(id, &transform_test_case(&item.decode::<ZephyrTestCase>()?)?)?
            },
            EntityType::TransformedTestCycles => {
                EntityRecord::from_value(id, &transform_test_cycle(&item.decode::<ZephyrTestCycle>()?)?)?
            },
            EntityType::TransformedTestExecutions => EntityRecord::from_value(
                id,
                &transform_test_execution(&item.decode::<ZephyrTestExecution>()?),
            )?,
            other => return Err(wrong_phase(other)),
        };
        self.store.stage_entity(project_key, entity_type, &record).await?;
        Ok(())
    }
}
