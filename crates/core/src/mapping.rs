//! Source-to-target id associations recorded during loading.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingType {
    FolderToModule,
    TestCaseToTestCase,
    TestCycleToTestCycle,
    TestExecutionToTestRun,
}

impl MappingType {
    pub const ALL: [Self; 4] = [
        Self::FolderToModule,
        Self::TestCaseToTestCase,
        Self::TestCycleToTestCycle,
        Self::TestExecutionToTestRun,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::FolderToModule => "folder_to_module",
            Self::TestCaseToTestCase => "testcase_to_testcase",
            Self::TestCycleToTestCycle => "cycle_to_cycle",
            Self::TestExecutionToTestRun => "execution_to_run",
        }
    }
}

impl Display for MappingType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::InvalidMappingType(s.to_owned()))
    }
}

/// Append-only record that `source_id` was created in the target as `target_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMapping {
    pub project_key: String,
    pub mapping_type: MappingType,
    pub source_id: String,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
}
