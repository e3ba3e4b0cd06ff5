//! Trait-object paths: `Storage` behind the async store traits and `StorageBackend`.

use std::sync::Arc;

use ztoq_core::{DatabaseConfig, EntityBatchUpdate, EntityType, MigrationStatus};

use super::create_test_storage;
use crate::backend::StorageBackend;
use crate::traits::{EntityBatchStore, MigrationStateStore, StateStore};

#[tokio::test]
async fn test_concurrent_progress_updates_are_serialized() {
    let (storage, _temp_dir) = create_test_storage();
    let store: Arc<dyn StateStore> = Arc::new(storage);
    store.create_entity_batch("PROJ", EntityType::TestCases, 0, 1, 50).await.unwrap();

    let mut handles = Vec::new();
    for count in 1..=50u32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .update_entity_batch("PROJ", EntityType::TestCases, 0, EntityBatchUpdate::progress(count))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let batches = store.get_entity_batches("PROJ", EntityType::TestCases).await.unwrap();
    assert_eq!(batches[0].processed_count, 50);
}

#[tokio::test]
async fn test_backend_connects_from_config() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config = DatabaseConfig::Sqlite { path: temp_dir.path().join("nested/ztoq.db"), pool_size: 2 };

    let backend = StorageBackend::connect(&config).await.unwrap();
    assert_eq!(backend.kind(), "sqlite");

    backend.create_entity_batch("PROJ", EntityType::Folders, 0, 1, 1).await.unwrap();
    for status in [MigrationStatus::InProgress, MigrationStatus::Completed] {
        backend
            .update_entity_batch("PROJ", EntityType::Folders, 0, EntityBatchUpdate::status(status))
            .await
            .unwrap();
    }
    assert!(backend.get_pending_entity_batches("PROJ", EntityType::Folders).await.unwrap().is_empty());
    assert!(backend.get_migration_state("PROJ").await.unwrap().is_none());
}
