//! Per-project phase status and resume metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{EntityType, MigrationStatus, Phase};

/// Progress of one phase, updated after every completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCursor {
    /// Entity type most recently worked on.
    pub entity_type: Option<EntityType>,
    /// Items processed so far across the phase's entity types.
    pub processed_items: u64,
    /// Items planned so far across the phase's entity types.
    pub total_items: u64,
}

/// Resume metadata attached to a [`MigrationState`].
///
/// Phase cursors are typed; `extra` is an open map for anything else a caller wants to
/// persist alongside the project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<PhaseCursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<PhaseCursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading: Option<PhaseCursor>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl MigrationMetadata {
    #[must_use]
    pub const fn cursor(&self, phase: Phase) -> Option<&PhaseCursor> {
        match phase {
            Phase::Extraction => self.extraction.as_ref(),
            Phase::Transformation => self.transformation.as_ref(),
            Phase::Loading => self.loading.as_ref(),
        }
    }

    fn cursor_slot(&mut self, phase: Phase) -> &mut Option<PhaseCursor> {
        match phase {
            Phase::Extraction => &mut self.extraction,
            Phase::Transformation => &mut self.transformation,
            Phase::Loading => &mut self.loading,
        }
    }

    /// Merges a patch into this metadata.
    ///
    /// A supplied cursor replaces that phase's cursor as a whole. Each supplied `extra`
    /// key is inserted or overwritten. Nothing absent from the patch is removed.
    pub fn merge(&mut self, patch: MetadataPatch) {
        for (phase, cursor) in patch.cursors {
            *self.cursor_slot(phase) = Some(cursor);
        }
        for (key, value) in patch.extra {
            self.extra.insert(key, value);
        }
    }
}

/// Incremental change to [`MigrationMetadata`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataPatch {
    pub cursors: Vec<(Phase, PhaseCursor)>,
    pub extra: Map<String, Value>,
}

impl MetadataPatch {
    #[must_use]
    pub fn cursor(mut self, phase: Phase, cursor: PhaseCursor) -> Self {
        self.cursors.push((phase, cursor));
        self
    }

    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty() && self.extra.is_empty()
    }
}

/// One row per project: the status of each phase and the last error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationState {
    pub project_key: String,
    pub extraction_status: MigrationStatus,
    pub transformation_status: MigrationStatus,
    pub loading_status: MigrationStatus,
    pub error_message: Option<String>,
    pub metadata: MigrationMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MigrationState {
    /// A fresh record with every phase `not_started`.
    #[must_use]
    pub fn new(project_key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            project_key: project_key.into(),
            extraction_status: MigrationStatus::NotStarted,
            transformation_status: MigrationStatus::NotStarted,
            loading_status: MigrationStatus::NotStarted,
            error_message: None,
            metadata: MigrationMetadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub const fn status(&self, phase: Phase) -> MigrationStatus {
        match phase {
            Phase::Extraction => self.extraction_status,
            Phase::Transformation => self.transformation_status,
            Phase::Loading => self.loading_status,
        }
    }

    /// Applies the supplied fields of `update`, leaving the rest untouched.
    pub fn apply(&mut self, update: MigrationStateUpdate, now: DateTime<Utc>) {
        if let Some(status) = update.extraction_status {
            self.extraction_status = status;
        }
        if let Some(status) = update.transformation_status {
            self.transformation_status = status;
        }
        if let Some(status) = update.loading_status {
            self.loading_status = status;
        }
        match update.error_message {
            ErrorPatch::Keep => {},
            ErrorPatch::Set(message) => self.error_message = Some(message),
            ErrorPatch::Clear => self.error_message = None,
        }
        if let Some(patch) = update.metadata_patch {
            self.metadata.merge(patch);
        }
        self.updated_at = now;
    }
}

/// What to do with a nullable error column on update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ErrorPatch {
    #[default]
    Keep,
    Set(String),
    Clear,
}

/// Partial update of a [`MigrationState`]; `None` fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationStateUpdate {
    pub extraction_status: Option<MigrationStatus>,
    pub transformation_status: Option<MigrationStatus>,
    pub loading_status: Option<MigrationStatus>,
    pub error_message: ErrorPatch,
    pub metadata_patch: Option<MetadataPatch>,
}

impl MigrationStateUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(mut self, phase: Phase, status: MigrationStatus) -> Self {
        match phase {
            Phase::Extraction => self.extraction_status = Some(status),
            Phase::Transformation => self.transformation_status = Some(status),
            Phase::Loading => self.loading_status = Some(status),
        }
        self
    }

    #[must_use]
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = ErrorPatch::Set(message.into());
        self
    }

    #[must_use]
    pub fn clear_error(mut self) -> Self {
        self.error_message = ErrorPatch::Clear;
        self
    }

    #[must_use]
    pub fn metadata(mut self, patch: MetadataPatch) -> Self {
        self.metadata_patch = Some(patch);
        self
    }
}
