use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ztoq_core::{EntityRecord, EntityType, SourceClient, ZephyrAttachment, ZephyrTestCase};
use ztoq_storage::{AttachmentStore, StagingStore, StateStore};

use super::wrong_phase;
use crate::controller::EntityFetcher;
use crate::error::MigrationError;
use crate::executor::ItemProcessor;

/// Attachment reference listed from a staged test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub test_case_id: i64,
    pub attachment: ZephyrAttachment,
}

/// Pulls source records into staging.
pub struct ExtractPhase {
    source: Arc<dyn SourceClient>,
    store: Arc<dyn StateStore>,
}

impl ExtractPhase {
    #[must_use]
    pub fn new(source: Arc<dyn SourceClient>, store: Arc<dyn StateStore>) -> Self {
        Self { source, store }
    }

    async fn stage(
        &self,
        project_key: &str,
        entity_type: EntityType,
        record: &EntityRecord,
    ) -> Result<(), MigrationError> {
        self.store.stage_entity(project_key, entity_type, record).await?;
        Ok(())
    }
}

fn records<T: Serialize>(
    items: &[T],
    id: impl Fn(&T) -> i64,
) -> Result<Vec<EntityRecord>, MigrationError> {
    items
        .iter()
        .map(|item| EntityRecord::from_value(id(item).to_string(), item).map_err(Into::into))
        .collect()
}

#[async_trait]
impl EntityFetcher for ExtractPhase {
    async fn fetch(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityRecord>, MigrationError> {
        match entity_type {
            EntityType::Folders => {
                self.source.get_project(project_key).await.map_err(MigrationError::Source)?;
                let folders =
                    self.source.get_folders(project_key).await.map_err(MigrationError::Source)?;
                records(&folders, |f| f.id)
            },
            EntityType::TestCases => {
                let cases =
                    self.source.get_test_cases(project_key).await.map_err(MigrationError::Source)?;
                records(&cases, |c| c.id)
            },
            EntityType::TestCycles => {
                let cycles =
                    self.source.get_test_cycles(project_key).await.map_err(MigrationError::Source)?;
                records(&cycles, |c| c.id)
            },
            EntityType::TestExecutions => {
                let executions = self
                    .source
                    .get_test_executions(project_key)
                    .await
                    .map_err(MigrationError::Source)?;
                records(&executions, |e| e.id)
            },
            EntityType::Attachments => {
                let staged = self.store.get_staged_entities(project_key, EntityType::TestCases).await?;
                let mut refs = Vec::new();
                for entity in staged {
                    let case: ZephyrTestCase = serde_json::from_value(entity.payload)?;
                    for attachment in case.attachments {
                        let id = attachment.id.clone();
                        let attachment_ref = AttachmentRef { test_case_id: case.id, attachment };
                        refs.push(EntityRecord::from_value(id, &attachment_ref)?);
                    }
                }
                Ok(refs)
            },
            other => Err(wrong_phase(other)),
        }
    }
}

#[async_trait]
impl ItemProcessor for ExtractPhase {
    async fn process(
        &self,
        project_key: &str,
        entity_type: EntityType,
        item: &EntityRecord,
    ) -> Result<(), MigrationError> {
        match entity_type {
            EntityType::Folders | EntityType::TestCycles | EntityType::TestExecutions => {
                self.stage(project_key, entity_type, item).await
            },
            EntityType::TestCases => {
                let mut case: ZephyrTestCase = item.decode()?;
                case.steps =
                    self.source.get_test_steps(&case.key).await.map_err(MigrationError::Source)?;
                let record = EntityRecord::from_value(item.entity_id.clone(), &case)?;
                self.stage(project_key, entity_type, &record).await
            },
            EntityType::Attachments => {
                let attachment_ref: AttachmentRef = item.decode()?;
                let attachment = &attachment_ref.attachment;
                let content = self
                    .source
                    .download_attachment(attachment)
                    .await
                    .map_err(MigrationError::Source)?;
                self.store
                    .save_attachment(
                        project_key,
                        &attachment.id,
                        &attachment.filename,
                        attachment.content_type.as_deref(),
                        &content,
                    )
                    .await?;
                tracing::debug!(
                    project_key,
                    attachment_id = %attachment.id,
                    bytes = content.len(),
                    "attachment stored"
                );
                self.stage(project_key, entity_type, item).await
            },
            other => Err(wrong_phase(other)),
        }
    }
}
