//! Test utilities and module declarations for storage tests.

use tempfile::TempDir;

use crate::Storage;

pub fn create_test_storage() -> (Storage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = Storage::new(&db_path, 4).unwrap();
    (storage, temp_dir)
}

mod async_tests;
mod attachment_tests;
mod mapping_tests;

#[test]
fn reopening_keeps_rows_and_schema_version() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("reopen.db");
    {
        let storage = Storage::new(&db_path, 2).unwrap();
        storage
            .update_migration_state("PROJ", ztoq_core::MigrationStateUpdate::new())
            .unwrap();
    }
    let storage = Storage::new(&db_path, 2).unwrap();
    assert!(storage.get_migration_state("PROJ").unwrap().is_some());

    let conn = crate::storage::get_conn(&storage.pool).unwrap();
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0)).unwrap();
    assert_eq!(version, crate::migrations::SCHEMA_VERSION);
}
