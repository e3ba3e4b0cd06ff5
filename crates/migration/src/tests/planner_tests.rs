use ztoq_core::EntityType;
use ztoq_storage::EntityBatchStore;

use super::{create_test_store, items};
use crate::error::MigrationError;
use crate::planner::plan_batches;

#[tokio::test]
async fn test_plan_partitions_items_in_order() {
    let (store, _temp_dir) = create_test_store();

    let planned =
        plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(25), 10).await.unwrap();

    let sizes: Vec<usize> = planned.iter().map(|b| b.items.len()).collect();
    assert_eq!(sizes, vec![10, 10, 5]);
    assert_eq!(planned[2].items[0].entity_id, "item-20");

    let stored = store.get_entity_batches("DEMO", EntityType::TestCases).await.unwrap();
    let numbers: Vec<u32> = stored.iter().map(|b| b.batch_number).collect();
    let counts: Vec<u32> = stored.iter().map(|b| b.items_count).collect();
    assert_eq!(numbers, vec![0, 1, 2]);
    assert_eq!(counts, vec![10, 10, 5]);
    assert!(stored.iter().all(|b| b.total_batches == 3));
}

#[tokio::test]
async fn test_plan_coverage_for_various_sizes() {
    let (store, _temp_dir) = create_test_store();

    for (n, size) in [(0usize, 3usize), (1, 1), (7, 3), (9, 3), (4, 100)] {
        let key = format!("P{n}-{size}");
        let planned =
            plan_batches(store.as_ref(), &key, EntityType::Folders, items(n), size).await.unwrap();
        let stored = store.get_entity_batches(&key, EntityType::Folders).await.unwrap();

        assert_eq!(planned.len(), n.div_ceil(size));
        assert_eq!(stored.len(), n.div_ceil(size));
        assert_eq!(stored.iter().map(|b| b.items_count as usize).sum::<usize>(), n);
    }
}

#[tokio::test]
async fn test_replanning_keeps_existing_rows() {
    let (store, _temp_dir) = create_test_store();
    plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(12), 5).await.unwrap();
    let before = store.get_entity_batches("DEMO", EntityType::TestCases).await.unwrap();

    let again =
        plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(12), 5).await.unwrap();
    let after = store.get_entity_batches("DEMO", EntityType::TestCases).await.unwrap();

    assert_eq!(again.len(), 3);
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_replanning_fills_missing_batch() {
    let (store, _temp_dir) = create_test_store();
    // A previous run crashed after registering only the first batch.
    store.create_entity_batch("DEMO", EntityType::TestCases, 0, 2, 5).await.unwrap();

    plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(8), 5).await.unwrap();

    let stored = store.get_entity_batches("DEMO", EntityType::TestCases).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].items_count, 3);
}

#[tokio::test]
async fn test_plan_mismatch_is_rejected() {
    let (store, _temp_dir) = create_test_store();
    plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(20), 10).await.unwrap();

    let err = plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(20), 5)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MigrationError::BatchPlanMismatch { expected: 2, found: 4, .. }
    ));
}

#[tokio::test]
async fn test_zero_batch_size_is_invalid() {
    let (store, _temp_dir) = create_test_store();
    let err = plan_batches(store.as_ref(), "DEMO", EntityType::TestCases, items(3), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::InvalidInput(_)));
}
