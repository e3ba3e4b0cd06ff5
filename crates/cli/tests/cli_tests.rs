use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ztoq(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ztoq").unwrap();
    cmd.env_remove("ZTOQ_DATABASE_URL")
        .env_remove("ZEPHYR_API_TOKEN")
        .env_remove("QTEST_API_TOKEN")
        .env_remove("QTEST_BASE_URL")
        .env_remove("QTEST_PROJECT_ID")
        .arg("--database-url")
        .arg(format!("sqlite:{}", temp_dir.path().join("state.db").display()));
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("ztoq").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resumable migration of Zephyr Scale test data"));
}

#[test]
fn test_cli_migrate_help() {
    let mut cmd = Command::cargo_bin("ztoq").unwrap();
    cmd.arg("migrate")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--resume-granularity"));
}

#[test]
fn test_status_of_empty_store_is_empty_list() {
    let temp_dir = TempDir::new().unwrap();
    ztoq(&temp_dir).arg("status").assert().success().stdout(predicate::str::contains("[]"));
}

#[test]
fn test_status_of_unknown_project_fails() {
    let temp_dir = TempDir::new().unwrap();
    ztoq(&temp_dir)
        .args(["status", "DEMO"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no migration state for project DEMO"));
}

#[test]
fn test_batches_and_mappings_on_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    ztoq(&temp_dir)
        .args(["batches", "DEMO", "--entity-type", "test_cases"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_batches\": 0"));
    ztoq(&temp_dir)
        .args(["mappings", "DEMO", "--mapping-type", "folder_to_module"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_unknown_entity_type_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    ztoq(&temp_dir)
        .args(["batches", "DEMO", "--entity-type", "widgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid entity type"));
}

#[test]
fn test_migrate_requires_credentials() {
    let temp_dir = TempDir::new().unwrap();
    ztoq(&temp_dir)
        .args(["migrate", "DEMO"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--zephyr-token"));
}

#[test]
fn test_unsupported_database_url_fails() {
    let mut cmd = Command::cargo_bin("ztoq").unwrap();
    cmd.env_remove("ZTOQ_DATABASE_URL")
        .args(["--database-url", "mysql://localhost/ztoq", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported database URL"));
}
