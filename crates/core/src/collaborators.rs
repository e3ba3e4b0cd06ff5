//! Source and target system abstractions.
//!
//! The migration engine only ever talks to Zephyr Scale and qTest through these traits,
//! which keeps the engine testable against in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    CreatedEntity, QTestModule, QTestTestCase, QTestTestCycle, QTestTestRun, ZephyrAttachment,
    ZephyrFolder, ZephyrProject, ZephyrTestCase, ZephyrTestCycle, ZephyrTestExecution,
    ZephyrTestStep,
};

/// Read side of the migration. Every call returns a finite, fully materialized sequence.
#[async_trait]
pub trait SourceClient: Send + Sync {
    async fn get_project(&self, project_key: &str) -> Result<ZephyrProject>;

    async fn get_folders(&self, project_key: &str) -> Result<Vec<ZephyrFolder>>;

    async fn get_test_cases(&self, project_key: &str) -> Result<Vec<ZephyrTestCase>>;

    async fn get_test_steps(&self, test_case_key: &str) -> Result<Vec<ZephyrTestStep>>;

    async fn get_test_cycles(&self, project_key: &str) -> Result<Vec<ZephyrTestCycle>>;

    async fn get_test_executions(&self, project_key: &str) -> Result<Vec<ZephyrTestExecution>>;

    async fn download_attachment(&self, attachment: &ZephyrAttachment) -> Result<Vec<u8>>;
}

/// Write side of the migration. Each call is one remote side effect.
#[async_trait]
pub trait TargetClient: Send + Sync {
    async fn create_module(&self, module: &QTestModule) -> Result<CreatedEntity>;

    async fn create_test_case(&self, test_case: &QTestTestCase) -> Result<CreatedEntity>;

    async fn create_test_cycle(&self, test_cycle: &QTestTestCycle) -> Result<CreatedEntity>;

    async fn create_test_run(&self, test_run: &QTestTestRun) -> Result<CreatedEntity>;
}
