//! Status vocabulary shared by phases and entity batches.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle status of a migration phase or an entity batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    /// Nothing has run yet.
    #[default]
    NotStarted,
    /// Work has begun and has not finished.
    InProgress,
    /// All work finished successfully.
    Completed,
    /// Work stopped on an error; retried by the next invocation.
    Failed,
}

impl MigrationStatus {
    pub const ALL: [Self; 4] = [Self::NotStarted, Self::InProgress, Self::Completed, Self::Failed];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether work with this status still has to be (re)done on resume.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        !matches!(*self, Self::Completed)
    }

    /// Whether `self -> next` is an edge of the phase/batch state machine.
    ///
    /// `in_progress -> in_progress` is allowed so that work left running by a
    /// crashed process can be picked up again. `completed` has no outgoing edge.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (*self, next),
            (Self::NotStarted, Self::InProgress)
                | (Self::InProgress, Self::InProgress | Self::Completed | Self::Failed)
                | (Self::Failed, Self::InProgress)
        )
    }

    /// Validates `self -> next`, returning the illegal edge as an error.
    pub fn transition_to(self, next: Self) -> Result<Self, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::IllegalTransition { from: self.as_str(), to: next.as_str() })
        }
    }
}

impl Display for MigrationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(CoreError::InvalidStatus(s.to_owned())),
        }
    }
}
