//! Migration phases and the entity types each phase moves.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Top-level stage of a project migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Pull records out of Zephyr Scale into the staging store.
    Extraction,
    /// Reshape staged Zephyr records into qTest records.
    Transformation,
    /// Create the transformed records in qTest.
    Loading,
}

impl Phase {
    /// Phases in execution order.
    pub const ORDERED: [Self; 3] = [Self::Extraction, Self::Transformation, Self::Loading];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Extraction => "extraction",
            Self::Transformation => "transformation",
            Self::Loading => "loading",
        }
    }

    /// Entity types processed by this phase, in processing order.
    #[must_use]
    pub const fn entity_types(&self) -> &'static [EntityType] {
        match *self {
            Self::Extraction => &[
                EntityType::Folders,
                EntityType::TestCases,
                EntityType::TestCycles,
                EntityType::TestExecutions,
                EntityType::Attachments,
            ],
            Self::Transformation => &[
                EntityType::TransformedTestCases,
                EntityType::TransformedTestCycles,
                EntityType::TransformedTestExecutions,
            ],
            Self::Loading => &[
                EntityType::LoadedTestCases,
                EntityType::LoadedTestCycles,
                EntityType::LoadedTestExecutions,
            ],
        }
    }

    /// The phase that must be completed before this one may run.
    #[must_use]
    pub const fn predecessor(&self) -> Option<Self> {
        match *self {
            Self::Extraction => None,
            Self::Transformation => Some(Self::Extraction),
            Self::Loading => Some(Self::Transformation),
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extraction" | "extract" => Ok(Self::Extraction),
            "transformation" | "transform" => Ok(Self::Transformation),
            "loading" | "load" => Ok(Self::Loading),
            _ => Err(CoreError::InvalidPhase(s.to_owned())),
        }
    }
}

/// Category of record tracked by batch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Folders,
    TestCases,
    TestCycles,
    TestExecutions,
    Attachments,
    TransformedTestCases,
    TransformedTestCycles,
    TransformedTestExecutions,
    LoadedTestCases,
    LoadedTestCycles,
    LoadedTestExecutions,
}

impl EntityType {
    pub const ALL: [Self; 11] = [
        Self::Folders,
        Self::TestCases,
        Self::TestCycles,
        Self::TestExecutions,
        Self::Attachments,
        Self::TransformedTestCases,
        Self::TransformedTestCycles,
        Self::TransformedTestExecutions,
        Self::LoadedTestCases,
        Self::LoadedTestCycles,
        Self::LoadedTestExecutions,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Folders => "folders",
            Self::TestCases => "test_cases",
            Self::TestCycles => "test_cycles",
            Self::TestExecutions => "test_executions",
            Self::Attachments => "attachments",
            Self::TransformedTestCases => "transformed_test_cases",
            Self::TransformedTestCycles => "transformed_test_cycles",
            Self::TransformedTestExecutions => "transformed_test_executions",
            Self::LoadedTestCases => "loaded_test_cases",
            Self::LoadedTestCycles => "loaded_test_cycles",
            Self::LoadedTestExecutions => "loaded_test_executions",
        }
    }

    /// The phase whose status covers batches of this entity type.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match *self {
            Self::Folders
            | Self::TestCases
            | Self::TestCycles
            | Self::TestExecutions
            | Self::Attachments => Phase::Extraction,
            Self::TransformedTestCases
            | Self::TransformedTestCycles
            | Self::TransformedTestExecutions => Phase::Transformation,
            Self::LoadedTestCases | Self::LoadedTestCycles | Self::LoadedTestExecutions => {
                Phase::Loading
            },
        }
    }

    /// Staged entity type this one reads its items from, if it is derived.
    #[must_use]
    pub const fn input(&self) -> Option<Self> {
        match *self {
            Self::TransformedTestCases => Some(Self::TestCases),
            Self::TransformedTestCycles => Some(Self::TestCycles),
            Self::TransformedTestExecutions => Some(Self::TestExecutions),
            Self::LoadedTestCases => Some(Self::TransformedTestCases),
            Self::LoadedTestCycles => Some(Self::TransformedTestCycles),
            Self::LoadedTestExecutions => Some(Self::TransformedTestExecutions),
            Self::Attachments => Some(Self::TestCases),
            Self::Folders | Self::TestCases | Self::TestCycles | Self::TestExecutions => None,
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::InvalidEntityType(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entity_type_belongs_to_the_phase_listing_it() {
        for phase in Phase::ORDERED {
            for entity_type in phase.entity_types() {
                assert_eq!(entity_type.phase(), phase, "{entity_type}");
            }
        }
        let listed: usize = Phase::ORDERED.iter().map(|p| p.entity_types().len()).sum();
        assert_eq!(listed, EntityType::ALL.len());
    }

    #[test]
    fn entity_types_round_trip_through_strings() {
        for entity_type in EntityType::ALL {
            assert_eq!(entity_type.as_str().parse::<EntityType>().unwrap(), entity_type);
        }
        assert!("modules".parse::<EntityType>().is_err());
    }

    #[test]
    fn phase_accepts_short_verbs() {
        assert_eq!("extract".parse::<Phase>().unwrap(), Phase::Extraction);
        assert_eq!("load".parse::<Phase>().unwrap(), Phase::Loading);
        assert_eq!(Phase::Loading.predecessor(), Some(Phase::Transformation));
        assert_eq!(Phase::Extraction.predecessor(), None);
    }
}
