//! Integration tests for PgStorage.
//! Run with: DATABASE_URL=... cargo test -p ztoq-storage --features postgres -- --ignored pg_

#![cfg(feature = "postgres")]
#![allow(clippy::unwrap_used, reason = "integration test code")]

use chrono::Utc;
use serde_json::json;
use ztoq_core::{
    EntityBatchUpdate, EntityRecord, EntityType, MappingType, MetadataPatch, MigrationStateUpdate,
    MigrationStatus, Phase,
};
use ztoq_storage::{PgStorage, StorageError};
use ztoq_storage::traits::{
    AttachmentStore, EntityBatchStore, EntityMappingStore, MigrationStateStore, StagingStore,
};

async fn create_pg_storage() -> PgStorage {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for PgStorage integration tests");
    PgStorage::new(&url).await.expect("Failed to connect to PostgreSQL")
}

fn unique_project() -> String {
    format!("PG{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

// ── MigrationState ───────────────────────────────────────────────

#[tokio::test]
#[ignore]
async fn pg_update_creates_and_merges_state() {
    let storage = create_pg_storage().await;
    let project = unique_project();

    storage
        .update_migration_state(
            &project,
            MigrationStateUpdate::new()
                .status(Phase::Extraction, MigrationStatus::Failed)
                .error("boom")
                .metadata(MetadataPatch::default().extra("a", json!(1))),
        )
        .await
        .unwrap();
    let state = storage
        .update_migration_state(
            &project,
            MigrationStateUpdate::new()
                .status(Phase::Extraction, MigrationStatus::InProgress)
                .clear_error()
                .metadata(MetadataPatch::default().extra("b", json!(2))),
        )
        .await
        .unwrap();

    assert_eq!(state.extraction_status, MigrationStatus::InProgress);
    assert_eq!(state.loading_status, MigrationStatus::NotStarted);
    assert!(state.error_message.is_none());
    assert_eq!(state.metadata.extra.len(), 2);

    let fetched = storage.get_migration_state(&project).await.unwrap().unwrap();
    assert_eq!(fetched.metadata, state.metadata);
}

// ── EntityBatch ──────────────────────────────────────────────────

#[tokio::test]
#[ignore]
async fn pg_duplicate_batch_rejected() {
    let storage = create_pg_storage().await;
    let project = unique_project();

    storage.create_entity_batch(&project, EntityType::TestCases, 0, 2, 10).await.unwrap();
    let err = storage.create_entity_batch(&project, EntityType::TestCases, 0, 2, 10).await;
    assert!(err.unwrap_err().is_duplicate());
}

#[tokio::test]
#[ignore]
async fn pg_batch_progress_and_pending() {
    let storage = create_pg_storage().await;
    let project = unique_project();
    storage.create_entity_batch(&project, EntityType::TestCases, 0, 2, 10).await.unwrap();
    storage.create_entity_batch(&project, EntityType::TestCases, 1, 2, 5).await.unwrap();

    let batch = storage
        .update_entity_batch(&project, EntityType::TestCases, 0, EntityBatchUpdate::progress(7))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch.processed_count, 7);
    let batch = storage
        .update_entity_batch(&project, EntityType::TestCases, 0, EntityBatchUpdate::progress(3))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch.processed_count, 7);

    for status in [MigrationStatus::InProgress, MigrationStatus::Completed] {
        storage
            .update_entity_batch(&project, EntityType::TestCases, 1, EntityBatchUpdate::status(status))
            .await
            .unwrap();
    }
    let err = storage
        .update_entity_batch(
            &project,
            EntityType::TestCases,
            1,
            EntityBatchUpdate::status(MigrationStatus::InProgress),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidTransition(_)));
    let pending = storage.get_pending_entity_batches(&project, EntityType::TestCases).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].batch_number, 0);
}

// ── Staging / mappings / attachments ─────────────────────────────

#[tokio::test]
#[ignore]
async fn pg_staging_upserts_in_order() {
    let storage = create_pg_storage().await;
    let project = unique_project();
    for (id, v) in [("b", 1), ("a", 2), ("b", 3)] {
        storage
            .stage_entity(&project, EntityType::Folders, &EntityRecord::new(id, json!({"v": v})))
            .await
            .unwrap();
    }
    let staged = storage.get_staged_entities(&project, EntityType::Folders).await.unwrap();
    assert_eq!(staged.len(), 2);
    assert_eq!(staged[0].entity_id, "b");
    assert_eq!(staged[0].payload, json!({"v": 3}));
}

#[tokio::test]
#[ignore]
async fn pg_mapping_first_write_wins() {
    let storage = create_pg_storage().await;
    let project = unique_project();
    assert!(storage.record_mapping(&project, MappingType::FolderToModule, "1", "a").await.unwrap());
    assert!(!storage.record_mapping(&project, MappingType::FolderToModule, "1", "b").await.unwrap());
    let all = storage.get_mappings(&project, None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].target_id, "a");
}

#[tokio::test]
#[ignore]
async fn pg_attachment_roundtrip() {
    let storage = create_pg_storage().await;
    let project = unique_project();
    storage.save_attachment(&project, "1", "f.bin", None, &[9, 8, 7]).await.unwrap();
    let stored = storage.get_attachment(&project, "1").await.unwrap().unwrap();
    assert_eq!(stored.content, vec![9, 8, 7]);
    assert_eq!(stored.size, 3);
}
