//! Intermediate records passed between phases.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EntityType;

/// One item handed to a batch: a stable id plus its JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_id: String,
    pub payload: Value,
}

impl EntityRecord {
    #[must_use]
    pub fn new(entity_id: impl Into<String>, payload: Value) -> Self {
        Self { entity_id: entity_id.into(), payload }
    }

    /// Builds a record from any serializable value.
    pub fn from_value<T: Serialize>(
        entity_id: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(entity_id, serde_json::to_value(value)?))
    }

    /// Decodes the payload into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// A record persisted in the staging area for `(project_key, entity_type)`.
///
/// Staging upserts by `entity_id`, so re-running an item overwrites rather than duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedEntity {
    pub project_key: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub payload: Value,
    pub updated_at: DateTime<Utc>,
}

impl From<StagedEntity> for EntityRecord {
    fn from(staged: StagedEntity) -> Self {
        Self { entity_id: staged.entity_id, payload: staged.payload }
    }
}
