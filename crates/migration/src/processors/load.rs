use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use ztoq_core::{
    EntityRecord, EntityType, MappingType, QTestModule, QTestTestRun, TargetClient, ZephyrFolder,
};
use ztoq_storage::{EntityMappingStore, StagingStore, StateStore};

use super::{staged_input, wrong_phase};
use crate::controller::EntityFetcher;
use crate::error::MigrationError;
use crate::executor::ItemProcessor;
use crate::transform::{
    LoadedEntity, TransformedTestCase, TransformedTestCycle, TransformedTestExecution,
};

/// Creates transformed records in the target and records source-to-target mappings.
pub struct LoadPhase {
    target: Arc<dyn TargetClient>,
    store: Arc<dyn StateStore>,
    /// Serializes module creation so concurrent batches create each folder once.
    modules: Mutex<()>,
}

impl LoadPhase {
    #[must_use]
    pub fn new(target: Arc<dyn TargetClient>, store: Arc<dyn StateStore>) -> Self {
        Self { target, store, modules: Mutex::new(()) }
    }

    async fn mapped_id(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: i64,
    ) -> Result<Option<i64>, MigrationError> {
        let source_id = source_id.to_string();
        let Some(mapping) = self.store.get_mapping(project_key, mapping_type, &source_id).await?
        else {
            return Ok(None);
        };
        mapping.target_id.parse().map(Some).map_err(|_| {
            MigrationError::InvalidInput(format!(
                "{mapping_type} mapping for {source_id} has non-numeric target id {}",
                mapping.target_id
            ))
        })
    }

    async fn require_mapped_id(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: i64,
    ) -> Result<i64, MigrationError> {
        self.mapped_id(project_key, mapping_type, source_id).await?.ok_or_else(|| {
            MigrationError::MissingMapping { mapping_type, source_id: source_id.to_string() }
        })
    }

    /// qTest module id for a Zephyr folder, creating the folder chain top-down if needed.
    async fn ensure_module(
        &self,
        project_key: &str,
        folder_id: i64,
    ) -> Result<i64, MigrationError> {
        let _guard = self.modules.lock().await;

        let mut chain: Vec<ZephyrFolder> = Vec::new();
        let mut next = Some(folder_id);
        let mut parent_module = None;
        while let Some(id) = next {
            if let Some(module_id) = self.mapped_id(project_key, MappingType::FolderToModule, id).await?
            {
                parent_module = Some(module_id);
                break;
            }
            if chain.iter().any(|f| f.id == id) {
                return Err(MigrationError::InvalidInput(format!("folder {id} has a parent cycle")));
            }
            let folder: ZephyrFolder = self
                .store
                .get_staged_entity(project_key, EntityType::Folders, &id.to_string())
                .await?
                .ok_or_else(|| MigrationError::MissingStaged {
                    entity_type: EntityType::Folders,
                    entity_id: id.to_string(),
                })
                .map(EntityRecord::from)?
                .decode()?;
            next = folder.parent_id;
            chain.push(folder);
        }

        for folder in chain.into_iter().rev() {
            let module = QTestModule { name: folder.name.clone(), description: None, parent_id: parent_module };
            let created = self.target.create_module(&module).await.map_err(MigrationError::Target)?;
            self.store
                .record_mapping(
                    project_key,
                    MappingType::FolderToModule,
                    &folder.id.to_string(),
                    &created.id.to_string(),
                )
                .await?;
            tracing::debug!(project_key, folder_id = folder.id, module_id = created.id, "module created");
            parent_module = Some(created.id);
        }

        parent_module.ok_or_else(|| MigrationError::MissingMapping {
            mapping_type: MappingType::FolderToModule,
            source_id: folder_id.to_string(),
        })
    }

    async fn finish(
        &self,
        project_key: &str,
        entity_type: EntityType,
        mapping_type: MappingType,
        item: &EntityRecord,
        loaded: LoadedEntity,
    ) -> Result<(), MigrationError> {
        self.store
            .record_mapping(
                project_key,
                mapping_type,
                &loaded.source_id.to_string(),
                &loaded.target_id.to_string(),
            )
            .await?;
        let record = EntityRecord::from_value(item.entity_id.clone(), &loaded)?;
        self.store.stage_entity(project_key, entity_type, &record).await?;
        Ok(())
    }
}

#[async_trait]
impl EntityFetcher for LoadPhase {
    async fn fetch(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityRecord>, MigrationError> {
        staged_input(self.store.as_ref(), project_key, entity_type).await
    }
}

#[async_trait]
impl ItemProcessor for LoadPhase {
    async fn process(
        &self,
        project_key: &str,
        entity_type: EntityType,
        item: &EntityRecord,
    ) -> Result<(), MigrationError> {
        match entity_type {
            EntityType::LoadedTestCases => {
                let transformed: TransformedTestCase = item.decode()?;
                let mut test_case = transformed.test_case;
                if let Some(folder_id) = transformed.folder_id {
                    test_case.parent_id = Some(self.ensure_module(project_key, folder_id).await?);
                }
                let created =
                    self.target.create_test_case(&test_case).await.map_err(MigrationError::Target)?;
                let loaded = LoadedEntity { source_id: transformed.source_id, target_id: created.id };
                self.finish(project_key, entity_type, MappingType::TestCaseToTestCase, item, loaded)
                    .await
            },
            EntityType::LoadedTestCycles => {
                let transformed: TransformedTestCycle = item.decode()?;
                let created = self
                    .target
                    .create_test_cycle(&transformed.test_cycle)
                    .await
                    .map_err(MigrationError::Target)?;
                let loaded = LoadedEntity { source_id: transformed.source_id, target_id: created.id };
                self.finish(project_key, entity_type, MappingType::TestCycleToTestCycle, item, loaded)
                    .await
            },
            EntityType::LoadedTestExecutions => {
                let transformed: TransformedTestExecution = item.decode()?;
                let test_case_id = self
                    .require_mapped_id(
                        project_key,
                        MappingType::TestCaseToTestCase,
                        transformed.source_test_case_id,
                    )
                    .await?;
                let test_cycle_id = match transformed.source_test_cycle_id {
                    Some(cycle) => Some(
                        self.require_mapped_id(project_key, MappingType::TestCycleToTestCycle, cycle)
                            .await?,
                    ),
                    None => None,
                };
                let run = QTestTestRun {
                    name: transformed.name,
                    test_case_id,
                    test_cycle_id,
                    status: transformed.status,
                    note: transformed.note,
                };
                let created =
                    self.target.create_test_run(&run).await.map_err(MigrationError::Target)?;
                let loaded = LoadedEntity { source_id: transformed.source_id, target_id: created.id };
                self.finish(project_key, entity_type, MappingType::TestExecutionToTestRun, item, loaded)
                    .await
            },
            other => Err(wrong_phase(other)),
        }
    }
}
