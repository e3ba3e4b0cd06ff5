use ztoq_core::{EntityType, MigrationStatus, ResumeGranularity};
use ztoq_storage::EntityBatchStore;

use super::{RecordingProcessor, create_test_store, granularities, items};
use crate::error::MigrationError;
use crate::executor::BatchExecutor;
use crate::planner::plan_batches;

#[tokio::test]
async fn test_batch_completes_and_counts_every_item() {
    let (store, _temp_dir) = create_test_store();
    let planned =
        plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(4), 10).await.unwrap();
    let executor = BatchExecutor::new(store.clone(), ResumeGranularity::Item);
    let processor = RecordingProcessor::default();

    let result = executor
        .execute_batch("DEMO", EntityType::TestCases, 0, &planned[0].items, &processor)
        .await
        .unwrap();

    assert_eq!(result.status, MigrationStatus::Completed);
    assert_eq!(result.processed_count, 4);
    assert_eq!(processor.seen(), vec!["item-0", "item-1", "item-2", "item-3"]);
    let batch = &store.get_entity_batches("DEMO", EntityType::TestCases).await.unwrap()[0];
    assert_eq!(batch.status, MigrationStatus::Completed);
    assert!(batch.started_at.is_some());
    assert!(batch.completed_at.is_some());
}

#[tokio::test]
async fn test_failure_keeps_partial_progress() {
    for granularity in granularities() {
        let (store, _temp_dir) = create_test_store();
        let planned =
            plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(5), 5).await.unwrap();
        let executor = BatchExecutor::new(store.clone(), granularity);
        let processor = RecordingProcessor::failing_once(&["item-3"]);

        let err = executor
            .execute_batch("DEMO", EntityType::TestCases, 0, &planned[0].items, &processor)
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::Target(_)));

        let batch = &store.get_entity_batches("DEMO", EntityType::TestCases).await.unwrap()[0];
        assert_eq!(batch.status, MigrationStatus::Failed, "{granularity}");
        assert_eq!(batch.processed_count, 3, "{granularity}");
        assert!(batch.error_message.as_deref().unwrap().contains("boom on item-3"));
    }
}

#[tokio::test]
async fn test_item_granularity_resumes_after_processed_prefix() {
    let (store, _temp_dir) = create_test_store();
    let planned =
        plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(5), 5).await.unwrap();
    let executor = BatchExecutor::new(store.clone(), ResumeGranularity::Item);
    let processor = RecordingProcessor::failing_once(&["item-3"]);

    executor
        .execute_batch("DEMO", EntityType::TestCases, 0, &planned[0].items, &processor)
        .await
        .unwrap_err();
    let result = executor
        .execute_batch("DEMO", EntityType::TestCases, 0, &planned[0].items, &processor)
        .await
        .unwrap();

    assert_eq!(result.items_run, 2);
    assert_eq!(result.processed_count, 5);
    assert_eq!(processor.seen(), vec!["item-0", "item-1", "item-2", "item-3", "item-4"]);
}

#[tokio::test]
async fn test_batch_granularity_restarts_from_zero() {
    let (store, _temp_dir) = create_test_store();
    let planned =
        plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(5), 5).await.unwrap();
    let executor = BatchExecutor::new(store.clone(), ResumeGranularity::Batch);
    let processor = RecordingProcessor::failing_once(&["item-3"]);

    executor
        .execute_batch("DEMO", EntityType::TestCases, 0, &planned[0].items, &processor)
        .await
        .unwrap_err();
    let result = executor
        .execute_batch("DEMO", EntityType::TestCases, 0, &planned[0].items, &processor)
        .await
        .unwrap();

    assert_eq!(result.items_run, 5);
    assert_eq!(result.status, MigrationStatus::Completed);
    assert_eq!(processor.seen().len(), 8);
}

#[tokio::test]
async fn test_unregistered_batch_is_an_error() {
    let (store, _temp_dir) = create_test_store();
    let executor = BatchExecutor::new(store, ResumeGranularity::Item);
    let processor = RecordingProcessor::default();

    let err = executor
        .execute_batch("DEMO", EntityType::TestCases, 7, &items(1), &processor)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::Storage(_)));
    assert!(processor.seen().is_empty());
}

#[tokio::test]
async fn test_completed_batch_is_not_run_again() {
    for granularity in granularities() {
        let (store, _temp_dir) = create_test_store();
        let planned =
            plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(3), 3).await.unwrap();
        let executor = BatchExecutor::new(store.clone(), granularity);
        let processor = RecordingProcessor::default();

        executor
            .execute_batch("DEMO", EntityType::TestCases, 0, &planned[0].items, &processor)
            .await
            .unwrap();
        let done = store.get_entity_batch("DEMO", EntityType::TestCases, 0).await.unwrap().unwrap();

        let rerun = executor
            .execute_batch("DEMO", EntityType::TestCases, 0, &planned[0].items, &processor)
            .await
            .unwrap();

        assert_eq!(rerun.items_run, 0, "{granularity}");
        assert_eq!(rerun.processed_count, 3, "{granularity}");
        assert_eq!(processor.seen().len(), 3, "{granularity}");
        let stored = store.get_entity_batch("DEMO", EntityType::TestCases, 0).await.unwrap().unwrap();
        assert_eq!(stored, done, "{granularity}");
    }
}
