//! Entity batch checkpoint records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, EntityType, MigrationStatus};

/// Checkpoint for one fixed slice of an entity type's items.
///
/// Unique per `(project_key, entity_type, batch_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBatchState {
    pub project_key: String,
    pub entity_type: EntityType,
    /// Zero-based position within `total_batches`.
    pub batch_number: u32,
    pub total_batches: u32,
    pub items_count: u32,
    /// Never decreases; never exceeds `items_count`.
    pub processed_count: u32,
    pub status: MigrationStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityBatchState {
    #[must_use]
    pub fn new(
        project_key: impl Into<String>,
        entity_type: EntityType,
        batch_number: u32,
        total_batches: u32,
        items_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            project_key: project_key.into(),
            entity_type,
            batch_number,
            total_batches,
            items_count,
            processed_count: 0,
            status: MigrationStatus::NotStarted,
            started_at: None,
            completed_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    /// Applies `update` while holding the record invariants.
    ///
    /// - `processed_count` is clamped to `[current, items_count]`.
    /// - `started_at` is set on the first move to `in_progress`.
    /// - moving to `completed` stamps `completed_at` and fills `processed_count`.
    /// - moving to `in_progress` or `completed` clears `error_message`.
    ///
    /// # Errors
    /// [`CoreError::IllegalTransition`] if the status change is not an edge of the
    /// state machine; the record is left unchanged.
    pub fn apply(&mut self, update: EntityBatchUpdate, now: DateTime<Utc>) -> Result<(), CoreError> {
        if let Some(status) = update.status {
            self.status.transition_to(status)?;
        }
        if let Some(count) = update.processed_count {
            self.processed_count = count.clamp(self.processed_count, self.items_count);
        }
        if let Some(status) = update.status {
            match status {
                MigrationStatus::InProgress => {
                    if self.started_at.is_none() {
                        self.started_at = Some(now);
                    }
                    self.completed_at = None;
                    self.error_message = None;
                },
                MigrationStatus::Completed => {
                    self.processed_count = self.items_count;
                    self.completed_at = Some(now);
                    self.error_message = None;
                },
                MigrationStatus::Failed | MigrationStatus::NotStarted => {},
            }
            self.status = status;
        }
        if let Some(message) = update.error_message {
            self.error_message = Some(message);
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Partial update of an [`EntityBatchState`]; `None` fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityBatchUpdate {
    pub status: Option<MigrationStatus>,
    pub processed_count: Option<u32>,
    pub error_message: Option<String>,
}

impl EntityBatchUpdate {
    #[must_use]
    pub fn status(status: MigrationStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    #[must_use]
    pub fn progress(processed_count: u32) -> Self {
        Self { processed_count: Some(processed_count), ..Self::default() }
    }

    #[must_use]
    pub fn failed(processed_count: u32, message: impl Into<String>) -> Self {
        Self {
            status: Some(MigrationStatus::Failed),
            processed_count: Some(processed_count),
            error_message: Some(message.into()),
        }
    }
}

/// Number of batches needed to cover `items` with `batch_size` per batch.
#[must_use]
pub const fn total_batches(items: usize, batch_size: usize) -> usize {
    items.div_ceil(batch_size)
}
