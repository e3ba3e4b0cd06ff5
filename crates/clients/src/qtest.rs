//! qTest Manager REST API v3 client.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use ztoq_core::{
    CreatedEntity, QTestModule, QTestRunStatus, QTestTestCase, QTestTestCycle, QTestTestRun,
    TargetClient,
};

use crate::error::ClientError;
use crate::http::{ApiClient, DEFAULT_TIMEOUT_SECS};

#[derive(Debug, Serialize)]
struct ModuleBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CycleBody<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct TestCaseRef {
    id: i64,
}

#[derive(Debug, Serialize)]
struct RunBody<'a> {
    name: &'a str,
    test_case: TestCaseRef,
}

#[derive(Debug, Serialize)]
struct TestLogBody<'a> {
    name: &'a str,
    status: QTestRunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
    exe_start_date: String,
    exe_end_date: String,
}

/// Client bound to one qTest project.
#[derive(Debug, Clone)]
pub struct QTestClient {
    api: ApiClient,
    project_id: i64,
}

impl QTestClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(base_url: &str, api_token: String, project_id: i64) -> Result<Self, ClientError> {
        Ok(Self {
            api: ApiClient::new(base_url, api_token, Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
            project_id,
        })
    }

    #[must_use]
    pub const fn project_id(&self) -> i64 {
        self.project_id
    }

    fn project_path(&self, rest: &str) -> String {
        format!("api/v3/projects/{}/{rest}", self.project_id)
    }

    /// Records the execution outcome on an existing run.
    async fn submit_test_log(&self, run_id: i64, run: &QTestTestRun) -> Result<(), ClientError> {
        let now = Utc::now().to_rfc3339();
        let body = TestLogBody {
            name: &run.name,
            status: run.status,
            note: run.note.as_deref(),
            exe_start_date: now.clone(),
            exe_end_date: now,
        };
        let _: serde_json::Value = self
            .api
            .post_json(&self.project_path(&format!("test-runs/{run_id}/auto-test-logs")), &[], &body)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TargetClient for QTestClient {
    async fn create_module(&self, module: &QTestModule) -> Result<CreatedEntity> {
        let query: Vec<(&str, String)> =
            module.parent_id.map(|id| ("parentId", id.to_string())).into_iter().collect();
        let body = ModuleBody { name: &module.name, description: module.description.as_deref() };
        let created: CreatedEntity =
            self.api.post_json(&self.project_path("modules"), &query, &body).await?;
        tracing::debug!(module = %module.name, id = created.id, "created qTest module");
        Ok(created)
    }

    async fn create_test_case(&self, test_case: &QTestTestCase) -> Result<CreatedEntity> {
        let created: CreatedEntity =
            self.api.post_json(&self.project_path("test-cases"), &[], test_case).await?;
        tracing::debug!(test_case = %test_case.name, id = created.id, "created qTest test case");
        Ok(created)
    }

    async fn create_test_cycle(&self, test_cycle: &QTestTestCycle) -> Result<CreatedEntity> {
        let query = match test_cycle.parent_id {
            Some(id) => vec![("parentId", id.to_string()), ("parentType", "test-cycle".to_owned())],
            None => vec![("parentId", "0".to_owned()), ("parentType", "root".to_owned())],
        };
        let body = CycleBody { name: &test_cycle.name, description: &test_cycle.description };
        let created: CreatedEntity =
            self.api.post_json(&self.project_path("test-cycles"), &query, &body).await?;
        tracing::debug!(test_cycle = %test_cycle.name, id = created.id, "created qTest test cycle");
        Ok(created)
    }

    async fn create_test_run(&self, test_run: &QTestTestRun) -> Result<CreatedEntity> {
        let query: Vec<(&str, String)> = test_run
            .test_cycle_id
            .map(|id| vec![("parentId", id.to_string()), ("parentType", "test-cycle".to_owned())])
            .unwrap_or_default();
        let body = RunBody { name: &test_run.name, test_case: TestCaseRef { id: test_run.test_case_id } };
        let created: CreatedEntity =
            self.api.post_json(&self.project_path("test-runs"), &query, &body).await?;

        if test_run.status != QTestRunStatus::Unexecuted {
            self.submit_test_log(created.id, test_run).await?;
        }
        tracing::debug!(test_run = %test_run.name, id = created.id, "created qTest test run");
        Ok(created)
    }
}
