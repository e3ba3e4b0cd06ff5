use std::sync::Arc;
use std::sync::atomic::Ordering;

use ztoq_core::{EntityType, MappingType, MigrationConfig, MigrationStatus, Phase, QTestRunStatus};
use ztoq_storage::{
    AttachmentStore, EntityBatchStore, EntityMappingStore, MigrationStateStore, StagingStore,
    StateStore,
};

use super::{FakeSource, FakeTarget, create_test_store};
use crate::error::MigrationError;
use crate::facade::MigrationFacade;

fn config() -> MigrationConfig {
    MigrationConfig { batch_size: 2, max_workers: 2, ..MigrationConfig::default() }
}

fn facade(
    store: &Arc<dyn StateStore>,
    source: &Arc<FakeSource>,
    target: &Arc<FakeTarget>,
) -> MigrationFacade {
    MigrationFacade::new("DEMO", &config(), Arc::clone(store), source.clone(), target.clone())
        .unwrap()
}

async fn statuses(store: &Arc<dyn StateStore>) -> [MigrationStatus; 3] {
    let state = store.get_migration_state("DEMO").await.unwrap().unwrap();
    [state.extraction_status, state.transformation_status, state.loading_status]
}

#[tokio::test]
async fn test_full_migration_moves_every_entity() {
    let (store, _temp_dir) = create_test_store();
    let source = Arc::new(FakeSource::new());
    let target = Arc::new(FakeTarget::default());

    let report = facade(&store, &source, &target).run_migration().await.unwrap();

    assert_eq!(report.phases.len(), 3);
    assert_eq!(statuses(&store).await, [MigrationStatus::Completed; 3]);
    assert_eq!(source.step_calls.load(Ordering::SeqCst), 3);

    let modules = target.modules.lock().unwrap().clone();
    assert_eq!(modules.len(), 2, "each folder becomes one module");
    assert_eq!(modules[0].name, "Root");
    assert_eq!(modules[0].parent_id, None);
    assert_eq!(modules[1].name, "Auth");
    assert!(modules[1].parent_id.is_some());

    let cases = target.test_cases.lock().unwrap().clone();
    assert_eq!(cases.len(), 3);
    assert!(cases.iter().all(|c| c.parent_id.is_some() && c.test_steps.len() == 1));
    assert_eq!(target.test_cycles.lock().unwrap().len(), 1);

    let runs = target.test_runs.lock().unwrap().clone();
    assert_eq!(runs.len(), 3);
    assert_eq!(runs.iter().filter(|r| r.status == QTestRunStatus::Failed).count(), 1);
    let case_targets = store
        .get_mappings("DEMO", Some(MappingType::TestCaseToTestCase))
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.target_id.parse::<i64>().unwrap())
        .collect::<Vec<_>>();
    assert!(runs.iter().all(|r| case_targets.contains(&r.test_case_id)));

    assert_eq!(store.get_mappings("DEMO", None).await.unwrap().len(), 2 + 3 + 1 + 3);
    assert_eq!(
        store.get_staged_entities("DEMO", EntityType::LoadedTestExecutions).await.unwrap().len(),
        3
    );
    let attachment = store.get_attachment("DEMO", "att-1").await.unwrap().unwrap();
    assert_eq!(attachment.content, b"content of log.txt");
}

#[tokio::test]
async fn test_phases_refuse_to_run_out_of_order() {
    let (store, _temp_dir) = create_test_store();
    let source = Arc::new(FakeSource::new());
    let target = Arc::new(FakeTarget::default());
    let facade = facade(&store, &source, &target);

    let err = facade.load_data().await.unwrap_err();
    assert!(matches!(
        err,
        MigrationError::PhaseOrder { phase: Phase::Loading, requires: Phase::Transformation }
    ));
    let err = facade.transform_data().await.unwrap_err();
    assert!(matches!(err, MigrationError::PhaseOrder { phase: Phase::Transformation, .. }));

    facade.extract_data().await.unwrap();
    assert!(matches!(facade.load_data().await, Err(MigrationError::PhaseOrder { .. })));
    assert_eq!(
        statuses(&store).await,
        [MigrationStatus::Completed, MigrationStatus::NotStarted, MigrationStatus::NotStarted]
    );
}

#[tokio::test]
async fn test_extraction_failure_is_persisted_and_resumable() {
    let (store, _temp_dir) = create_test_store();
    let source = Arc::new(FakeSource::new());
    let target = Arc::new(FakeTarget::default());
    *source.fail_executions.lock().unwrap() = true;

    let err = facade(&store, &source, &target).run_migration().await.unwrap_err();
    assert!(matches!(err, MigrationError::Source(_)));

    let state = store.get_migration_state("DEMO").await.unwrap().unwrap();
    assert_eq!(state.extraction_status, MigrationStatus::Failed);
    assert_eq!(state.transformation_status, MigrationStatus::NotStarted);
    assert!(state.error_message.unwrap().contains("executions endpoint unavailable"));

    *source.fail_executions.lock().unwrap() = false;
    facade(&store, &source, &target).run_migration().await.unwrap();

    assert_eq!(statuses(&store).await, [MigrationStatus::Completed; 3]);
    // Test case batches completed in the first run are not fetched again item by item.
    assert_eq!(source.step_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_load_failure_resumes_without_duplicate_creates() {
    let (store, _temp_dir) = create_test_store();
    let source = Arc::new(FakeSource::new());
    let target = Arc::new(FakeTarget::default());
    *target.fail_case_named.lock().unwrap() = Some("Case 2".to_owned());

    facade(&store, &source, &target).run_migration().await.unwrap_err();
    assert_eq!(
        statuses(&store).await,
        [MigrationStatus::Completed, MigrationStatus::Completed, MigrationStatus::Failed]
    );

    facade(&store, &source, &target).run_migration().await.unwrap();

    assert_eq!(statuses(&store).await, [MigrationStatus::Completed; 3]);
    let mut names: Vec<String> =
        target.test_cases.lock().unwrap().iter().map(|c| c.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["Case 1", "Case 2", "Case 3"]);
    assert_eq!(target.modules.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_project_fails_extraction() {
    let (store, _temp_dir) = create_test_store();
    let facade = MigrationFacade::new(
        "NOPE",
        &config(),
        Arc::clone(&store),
        Arc::new(FakeSource::new()),
        Arc::new(FakeTarget::default()),
    )
    .unwrap();

    let err = facade.extract_data().await.unwrap_err();
    assert!(matches!(err, MigrationError::Source(_)));

    let state = store.get_migration_state("NOPE").await.unwrap().unwrap();
    assert_eq!(state.extraction_status, MigrationStatus::Failed);
    assert!(state.error_message.unwrap().contains("not found"));
    assert!(store.get_entity_batches("NOPE", EntityType::Folders).await.unwrap().is_empty());

    let retry = facade.extract_data().await.unwrap_err();
    assert!(matches!(retry, MigrationError::Source(_)));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (store, _temp_dir) = create_test_store();
    let config = MigrationConfig { batch_size: 0, ..MigrationConfig::default() };

    let result = MigrationFacade::new(
        "DEMO",
        &config,
        store,
        Arc::new(FakeSource::new()),
        Arc::new(FakeTarget::default()),
    );

    assert!(matches!(result, Err(MigrationError::State(_))));
}
