//! Plain records exchanged with the source (Zephyr Scale) and target (qTest) systems.

use serde::{Deserialize, Serialize};

/// Reference to another Zephyr object by id, optionally carrying its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZephyrRef {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZephyrProject {
    pub id: i64,
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZephyrFolder {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub folder_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZephyrTestStep {
    pub index: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub test_data: Option<String>,
    #[serde(default)]
    pub expected_result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZephyrAttachment {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZephyrTestCase {
    pub id: i64,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub precondition: Option<String>,
    #[serde(default)]
    pub priority: Option<ZephyrRef>,
    #[serde(default)]
    pub status: Option<ZephyrRef>,
    #[serde(default)]
    pub folder: Option<ZephyrRef>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Filled in during extraction from the per-case steps endpoint.
    #[serde(default)]
    pub steps: Vec<ZephyrTestStep>,
    #[serde(default)]
    pub attachments: Vec<ZephyrAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZephyrTestCycle {
    pub id: i64,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub folder: Option<ZephyrRef>,
    #[serde(default)]
    pub status: Option<ZephyrRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZephyrTestExecution {
    pub id: i64,
    #[serde(default)]
    pub key: Option<String>,
    pub test_case: ZephyrRef,
    #[serde(default)]
    pub test_cycle: Option<ZephyrRef>,
    pub test_execution_status: ZephyrRef,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub executed_by_id: Option<String>,
    #[serde(default)]
    pub actual_end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QTestModule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QTestStep {
    pub description: String,
    pub expected: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QTestProperty {
    pub field_name: String,
    pub field_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QTestTestCase {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub precondition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub test_steps: Vec<QTestStep>,
    #[serde(default)]
    pub properties: Vec<QTestProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QTestTestCycle {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// Execution outcome as named by qTest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QTestRunStatus {
    Passed,
    Failed,
    Blocked,
    Incomplete,
    Unexecuted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QTestTestRun {
    pub name: String,
    pub test_case_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_cycle_id: Option<i64>,
    pub status: QTestRunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Id returned by a target create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEntity {
    pub id: i64,
}
