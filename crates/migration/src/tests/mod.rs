//! Test doubles and helpers for the migration engine.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use ztoq_core::{
    CreatedEntity, EntityRecord, EntityType, QTestModule, QTestTestCase, QTestTestCycle,
    QTestTestRun, ResumeGranularity, SourceClient, TargetClient, ZephyrAttachment, ZephyrFolder,
    ZephyrProject, ZephyrRef, ZephyrTestCase, ZephyrTestCycle, ZephyrTestExecution, ZephyrTestStep,
};
use ztoq_storage::{StateStore, Storage};

use crate::controller::EntityFetcher;
use crate::error::MigrationError;
use crate::executor::ItemProcessor;

mod executor_tests;
mod facade_tests;
mod planner_tests;

pub fn create_test_store() -> (Arc<dyn StateStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(&temp_dir.path().join("state.db"), 4).unwrap();
    (Arc::new(storage), temp_dir)
}

pub fn items(count: usize) -> Vec<EntityRecord> {
    (0..count).map(|i| EntityRecord::new(format!("item-{i}"), json!({ "n": i }))).collect()
}

/// Returns a fixed item list for one entity type and nothing for the others.
pub struct StaticFetcher {
    pub entity_type: EntityType,
    pub items: Vec<EntityRecord>,
    pub calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(entity_type: EntityType, items: Vec<EntityRecord>) -> Self {
        Self { entity_type, items, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EntityFetcher for StaticFetcher {
    async fn fetch(
        &self,
        _project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityRecord>, MigrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(if entity_type == self.entity_type { self.items.clone() } else { Vec::new() })
    }
}

/// Records every processed item id; fails once on each id in `fail_once`.
#[derive(Default)]
pub struct RecordingProcessor {
    pub seen: Mutex<Vec<String>>,
    pub fail_once: Mutex<HashSet<String>>,
}

impl RecordingProcessor {
    pub fn failing_once(ids: &[&str]) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            fail_once: Mutex::new(ids.iter().map(|s| (*s).to_owned()).collect()),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemProcessor for RecordingProcessor {
    async fn process(
        &self,
        _project_key: &str,
        _entity_type: EntityType,
        item: &EntityRecord,
    ) -> Result<(), MigrationError> {
        if self.fail_once.lock().unwrap().remove(&item.entity_id) {
            return Err(MigrationError::Target(anyhow::anyhow!("boom on {}", item.entity_id)));
        }
        self.seen.lock().unwrap().push(item.entity_id.clone());
        Ok(())
    }
}

fn zref(id: i64, name: &str) -> ZephyrRef {
    ZephyrRef { id, name: Some(name.to_owned()) }
}

/// In-memory Zephyr project: two nested folders, three cases, one cycle, three executions.
pub struct FakeSource {
    pub fail_executions: Mutex<bool>,
    pub step_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self { fail_executions: Mutex::new(false), step_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl SourceClient for FakeSource {
    async fn get_project(&self, project_key: &str) -> anyhow::Result<ZephyrProject> {
        if project_key != "DEMO" {
            anyhow::bail!("project {project_key} not found");
        }
        Ok(ZephyrProject { id: 1, key: "DEMO".to_owned(), name: Some("Demo".to_owned()) })
    }

    async fn get_folders(&self, _project_key: &str) -> anyhow::Result<Vec<ZephyrFolder>> {
        Ok(vec![
            ZephyrFolder { id: 10, name: "Root".to_owned(), parent_id: None, folder_type: None },
            ZephyrFolder { id: 11, name: "Auth".to_owned(), parent_id: Some(10), folder_type: None },
        ])
    }

    async fn get_test_cases(&self, _project_key: &str) -> anyhow::Result<Vec<ZephyrTestCase>> {
        Ok((1..=3)
            .map(|id| ZephyrTestCase {
                id,
                key: format!("DEMO-T{id}"),
                name: format!("Case {id}"),
                objective: None,
                precondition: None,
                priority: Some(zref(1, "High")),
                status: None,
                folder: Some(zref(if id == 1 { 10 } else { 11 }, "folder")),
                labels: Vec::new(),
                steps: Vec::new(),
                attachments: if id == 1 {
                    vec![ZephyrAttachment {
                        id: "att-1".to_owned(),
                        filename: "log.txt".to_owned(),
                        url: Some("https://example.invalid/att-1".to_owned()),
                        content_type: Some("text/plain".to_owned()),
                    }]
                } else {
                    Vec::new()
                },
            })
            .collect())
    }

    async fn get_test_steps(&self, test_case_key: &str) -> anyhow::Result<Vec<ZephyrTestStep>> {
        self.step_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![ZephyrTestStep {
            index: 1,
            description: Some(format!("Run {test_case_key}")),
            test_data: None,
            expected_result: Some("ok".to_owned()),
        }])
    }

    async fn get_test_cycles(&self, _project_key: &str) -> anyhow::Result<Vec<ZephyrTestCycle>> {
        Ok(vec![ZephyrTestCycle {
            id: 50,
            key: "DEMO-R50".to_owned(),
            name: "Sprint 1".to_owned(),
            description: None,
            folder: None,
            status: None,
        }])
    }

    async fn get_test_executions(
        &self,
        _project_key: &str,
    ) -> anyhow::Result<Vec<ZephyrTestExecution>> {
        if *self.fail_executions.lock().unwrap() {
            anyhow::bail!("executions endpoint unavailable");
        }
        Ok((1..=3)
            .map(|case| ZephyrTestExecution {
                id: 100 + case,
                key: Some(format!("DEMO-E{case}")),
                test_case: ZephyrRef { id: case, name: None },
                test_cycle: Some(ZephyrRef { id: 50, name: None }),
                test_execution_status: zref(1, if case == 2 { "Fail" } else { "Pass" }),
                comment: None,
                executed_by_id: None,
                actual_end_date: None,
            })
            .collect())
    }

    async fn download_attachment(&self, attachment: &ZephyrAttachment) -> anyhow::Result<Vec<u8>> {
        Ok(format!("content of {}", attachment.filename).into_bytes())
    }
}

/// Target double handing out sequential ids; can fail the n-th test case create.
#[derive(Default)]
pub struct FakeTarget {
    next_id: AtomicI64,
    pub modules: Mutex<Vec<QTestModule>>,
    pub test_cases: Mutex<Vec<QTestTestCase>>,
    pub test_cycles: Mutex<Vec<QTestTestCycle>>,
    pub test_runs: Mutex<Vec<QTestTestRun>>,
    pub fail_case_named: Mutex<Option<String>>,
}

impl FakeTarget {
    fn next(&self) -> CreatedEntity {
        CreatedEntity { id: 1000 + self.next_id.fetch_add(1, Ordering::SeqCst) }
    }
}

#[async_trait]
impl TargetClient for FakeTarget {
    async fn create_module(&self, module: &QTestModule) -> anyhow::Result<CreatedEntity> {
        self.modules.lock().unwrap().push(module.clone());
        Ok(self.next())
    }

    async fn create_test_case(&self, test_case: &QTestTestCase) -> anyhow::Result<CreatedEntity> {
        let mut fail = self.fail_case_named.lock().unwrap();
        if fail.as_deref() == Some(test_case.name.as_str()) {
            *fail = None;
            anyhow::bail!("qTest rejected {}", test_case.name);
        }
        drop(fail);
        self.test_cases.lock().unwrap().push(test_case.clone());
        Ok(self.next())
    }

    async fn create_test_cycle(&self, test_cycle: &QTestTestCycle) -> anyhow::Result<CreatedEntity> {
        self.test_cycles.lock().unwrap().push(test_cycle.clone());
        Ok(self.next())
    }

    async fn create_test_run(&self, test_run: &QTestTestRun) -> anyhow::Result<CreatedEntity> {
        self.test_runs.lock().unwrap().push(test_run.clone());
        Ok(self.next())
    }
}

pub const fn granularities() -> [ResumeGranularity; 2] {
    [ResumeGranularity::Item, ResumeGranularity::Batch]
}
