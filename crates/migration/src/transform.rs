//! Pure mappings from Zephyr Scale records to their qTest shapes.
//!
//! Target parent ids are not known until loading, so transformed records carry the
//! Zephyr folder / case / cycle ids and the loader resolves them through mappings.

use serde::{Deserialize, Serialize};
use ztoq_core::{
    QTestProperty, QTestRunStatus, QTestStep, QTestTestCase, QTestTestCycle, ZephyrRef,
    ZephyrTestCase, ZephyrTestCycle, ZephyrTestExecution, ZephyrTestStep,
};

use crate::error::MigrationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformedTestCase {
    pub source_id: i64,
    pub source_key: String,
    /// Zephyr folder the case lives in; becomes the qTest parent module.
    pub folder_id: Option<i64>,
    pub test_case: QTestTestCase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformedTestCycle {
    pub source_id: i64,
    pub source_key: String,
    pub folder_id: Option<i64>,
    pub test_cycle: QTestTestCycle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformedTestExecution {
    pub source_id: i64,
    pub source_test_case_id: i64,
    pub source_test_cycle_id: Option<i64>,
    pub name: String,
    pub status: QTestRunStatus,
    pub note: Option<String>,
}

/// Result staged by the loader for every created target entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedEntity {
    pub source_id: i64,
    pub target_id: i64,
}

/// Maps a Zephyr execution status name to a qTest run status.
#[must_use]
pub fn map_execution_status(name: &str) -> QTestRunStatus {
    match name.trim().to_ascii_lowercase().as_str() {
        "pass" | "passed" => QTestRunStatus::Passed,
        "fail" | "failed" => QTestRunStatus::Failed,
        "blocked" => QTestRunStatus::Blocked,
        "in progress" | "in_progress" => QTestRunStatus::Incomplete,
        _ => QTestRunStatus::Unexecuted,
    }
}

/// Maps a Zephyr priority name to the qTest priority value, if it has one.
#[must_use]
pub fn map_priority(name: &str) -> Option<&'static str> {
    match name.trim().to_ascii_lowercase().as_str() {
        "high" | "critical" | "blocker" => Some("High"),
        "normal" | "medium" => Some("Medium"),
        "low" | "trivial" => Some("Low"),
        _ => None,
    }
}

fn step_description(step: &ZephyrTestStep) -> String {
    let description = step.description.clone().unwrap_or_default();
    match step.test_data.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(data) if description.is_empty() => format!("Test data: {data}"),
        Some(data) => format!("{description}\n\nTest data: {data}"),
        None => description,
    }
}

fn ref_name(reference: Option<&ZephyrRef>) -> Option<&str> {
    reference.and_then(|r| r.name.as_deref())
}

/// # Errors
/// [`MigrationError::Transform`] if the case has no name.
pub fn transform_test_case(case: &ZephyrTestCase) -> Result<TransformedTestCase, MigrationError> {
    if case.name.trim().is_empty() {
        return Err(MigrationError::Transform(format!("test case {} has no name", case.key)));
    }

    let mut steps: Vec<&ZephyrTestStep> = case.steps.iter().collect();
    steps.sort_by_key(|s| s.index);
    let test_steps = steps
        .into_iter()
        .zip(1u32..)
        .map(|(step, order)| QTestStep {
            description: step_description(step),
            expected: step.expected_result.clone().unwrap_or_default(),
            order,
        })
        .collect();

    let mut properties =
        vec![QTestProperty { field_name: "Zephyr Key".to_owned(), field_value: case.key.clone() }];
    if let Some(priority) = ref_name(case.priority.as_ref()).and_then(map_priority) {
        properties.push(QTestProperty {
            field_name: "Priority".to_owned(),
            field_value: priority.to_owned(),
        });
    }
    if !case.labels.is_empty() {
        properties.push(QTestProperty {
            field_name: "Labels".to_owned(),
            field_value: case.labels.join(", "),
        });
    }

    Ok(TransformedTestCase {
        source_id: case.id,
        source_key: case.key.clone(),
        folder_id: case.folder.as_ref().map(|f| f.id),
        test_case: QTestTestCase {
            name: case.name.trim().to_owned(),
            description: case.objective.clone().unwrap_or_default(),
            precondition: case.precondition.clone().unwrap_or_default(),
            parent_id: None,
            test_steps,
            properties,
        },
    })
}

/// # Errors
/// [`MigrationError::Transform`] if the cycle has no name.
pub fn transform_test_cycle(
    cycle: &ZephyrTestCycle,
) -> Result<TransformedTestCycle, MigrationError> {
    if cycle.name.trim().is_empty() {
        return Err(MigrationError::Transform(format!("test cycle {} has no name", cycle.key)));
    }
    Ok(TransformedTestCycle {
        source_id: cycle.id,
        source_key: cycle.key.clone(),
        folder_id: cycle.folder.as_ref().map(|f| f.id),
        test_cycle: QTestTestCycle {
            name: cycle.name.trim().to_owned(),
            description: cycle.description.clone().unwrap_or_default(),
            parent_id: None,
        },
    })
}

#[must_use]
pub fn transform_test_execution(execution: &ZephyrTestExecution) -> TransformedTestExecution {
    let name = execution
        .test_case
        .name
        .clone()
        .or_else(|| execution.key.clone())
        .unwrap_or_else(|| format!("Execution {}", execution.id));

    let mut note_lines = Vec::new();
    if let Some(comment) = execution.comment.as_deref().filter(|c| !c.trim().is_empty()) {
        note_lines.push(comment.trim().to_owned());
    }
    if let Some(by) = &execution.executed_by_id {
        note_lines.push(format!("Executed by: {by}"));
    }
    if let Some(at) = &execution.actual_end_date {
        note_lines.push(format!("Executed at: {at}"));
    }

    TransformedTestExecution {
        source_id: execution.id,
        source_test_case_id: execution.test_case.id,
        source_test_cycle_id: execution.test_cycle.as_ref().map(|c| c.id),
        name,
        status: map_execution_status(
            execution.test_execution_status.name.as_deref().unwrap_or_default(),
        ),
        note: (!note_lines.is_empty()).then(|| note_lines.join("\n")),
    }
}
