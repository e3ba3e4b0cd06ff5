//! Phase controller: drives one phase of a project through plan, execute and verify.
//!
//! Holds no resume state of its own. Every decision about what still needs work comes
//! from the batch rows in the state store, so a second invocation after a failure or
//! crash re-runs exactly the batches that are not `completed`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::task::{JoinError, JoinSet};
use ztoq_core::{
    EntityRecord, EntityType, MetadataPatch, MigrationState, MigrationStateUpdate,
    MigrationStatus, Phase, PhaseCursor, ResumeGranularity, truncate_error_message,
};
use ztoq_storage::{EntityBatchStore, MigrationStateStore, StateStore};

use crate::error::MigrationError;
use crate::executor::{BatchExecutor, BatchResult, ItemProcessor};
use crate::planner::plan_batches;

/// Supplies the full, ordered item list of an entity type.
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    async fn fetch(
        &self,
        project_key: &str,
        entity_type: EntityType,
    ) -> Result<Vec<EntityRecord>, MigrationError>;
}

/// Per entity type outcome of a phase run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityTypeReport {
    pub entity_type: EntityType,
    pub total_items: u64,
    pub total_batches: u32,
    /// Batches executed by this run (pending ones only).
    pub batches_run: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub project_key: String,
    pub phase: Phase,
    /// The phase was already completed and nothing was fetched.
    pub skipped: bool,
    pub entity_types: Vec<EntityTypeReport>,
}

#[derive(Clone)]
pub struct PhaseController {
    store: Arc<dyn StateStore>,
    executor: BatchExecutor,
    batch_size: usize,
    max_workers: usize,
}

impl PhaseController {
    #[must_use]
    pub fn new(
        store: Arc<dyn StateStore>,
        batch_size: usize,
        max_workers: usize,
        granularity: ResumeGranularity,
    ) -> Self {
        let executor = BatchExecutor::new(Arc::clone(&store), granularity);
        Self { store, executor, batch_size, max_workers: max_workers.max(1) }
    }

    /// Current persisted state of a project, defaulting to all phases `not_started`.
    pub(crate) async fn state(&self, project_key: &str) -> Result<MigrationState, MigrationError> {
        Ok(self
            .store
            .get_migration_state(project_key)
            .await?
            .unwrap_or_else(|| MigrationState::new(project_key, Utc::now())))
    }

    /// Runs every entity type of `phase` to completion.
    ///
    /// A phase already `completed` is skipped without calling `fetcher`. Entity types run
    /// in order; within one type, pending batches run concurrently up to `max_workers`.
    /// Once a batch failure has been collected no further batch is started. In-flight
    /// batches are awaited, the phase is marked `failed` with the first error message,
    /// and that error is returned.
    ///
    /// # Errors
    /// Any fetch, planning, processing or storage error.
    pub async fn run_phase(
        &self,
        project_key: &str,
        phase: Phase,
        fetcher: &dyn EntityFetcher,
        processor: Arc<dyn ItemProcessor>,
    ) -> Result<PhaseReport, MigrationError> {
        let current = self.state(project_key).await?.status(phase);
        if current == MigrationStatus::Completed {
            tracing::info!(project_key, phase = %phase, "phase already completed, skipping");
            return Ok(PhaseReport {
                project_key: project_key.to_owned(),
                phase,
                skipped: true,
                entity_types: Vec::new(),
            });
        }
        current.transition_to(MigrationStatus::InProgress)?;
        self.store
            .update_migration_state(
                project_key,
                MigrationStateUpdate::new()
                    .status(phase, MigrationStatus::InProgress)
                    .clear_error(),
            )
            .await?;
        tracing::info!(project_key, phase = %phase, "phase started");

        match self.run_entity_types(project_key, phase, fetcher, processor).await {
            Ok(entity_types) => {
                MigrationStatus::InProgress.transition_to(MigrationStatus::Completed)?;
                self.store
                    .update_migration_state(
                        project_key,
                        MigrationStateUpdate::new().status(phase, MigrationStatus::Completed),
                    )
                    .await?;
                tracing::info!(project_key, phase = %phase, "phase completed");
                Ok(PhaseReport {
                    project_key: project_key.to_owned(),
                    phase,
                    skipped: false,
                    entity_types,
                })
            },
            Err(e) => {
                self.fail_phase(project_key, phase, &e).await;
                Err(e)
            },
        }
    }

    /// Persists a phase failure. A store error here is logged, not raised, so the
    /// caller still sees the original error.
    async fn fail_phase(&self, project_key: &str, phase: Phase, error: &MigrationError) {
        let message = truncate_error_message(&error.to_string());
        tracing::error!(project_key, phase = %phase, error = %message, "phase failed");
        if let Err(store_err) = self
            .store
            .update_migration_state(
                project_key,
                MigrationStateUpdate::new().status(phase, MigrationStatus::Failed).error(message),
            )
            .await
        {
            tracing::error!(project_key, phase = %phase, error = %store_err, "failed to record phase failure");
        }
    }

    async fn run_entity_types(
        &self,
        project_key: &str,
        phase: Phase,
        fetcher: &dyn EntityFetcher,
        processor: Arc<dyn ItemProcessor>,
    ) -> Result<Vec<EntityTypeReport>, MigrationError> {
        let mut cursor = PhaseCursor::default();
        let mut reports = Vec::with_capacity(phase.entity_types().len());

        for &entity_type in phase.entity_types() {
            let items = fetcher.fetch(project_key, entity_type).await?;
            let total_items = items.len() as u64;
            let planned =
                plan_batches(self.store.as_ref(), project_key, entity_type, items, self.batch_size)
                    .await?;
            let total_batches = u32::try_from(planned.len()).unwrap_or(u32::MAX);

            let batches = self.store.get_entity_batches(project_key, entity_type).await?;
            cursor.entity_type = Some(entity_type);
            cursor.total_items += total_items;
            cursor.processed_items += batches
                .iter()
                .filter(|b| !b.is_pending())
                .map(|b| u64::from(b.items_count))
                .sum::<u64>();

            let mut tally = BatchTally {
                project_key,
                phase,
                entity_type,
                items_count: batches.iter().map(|b| (b.batch_number, b.items_count)).collect(),
                cursor,
                first_error: None,
            };
            let mut slices: HashMap<u32, Vec<EntityRecord>> =
                planned.into_iter().map(|p| (p.batch_number, p.items)).collect();
            let pending = batches.iter().filter(|b| b.is_pending()).map(|b| b.batch_number);

            let mut batches_run = 0u32;
            let mut workers = JoinSet::new();

            for batch_number in pending {
                // A full pool waits for a batch to finish and sees its outcome before
                // another batch is admitted.
                while workers.len() >= self.max_workers {
                    let Some(joined) = workers.join_next().await else { break };
                    self.on_batch_done(&mut tally, joined).await;
                }
                while let Some(joined) = workers.try_join_next() {
                    self.on_batch_done(&mut tally, joined).await;
                }
                if tally.first_error.is_some() {
                    break;
                }
                let executor = self.executor.clone();
                let processor = Arc::clone(&processor);
                let owned_key = project_key.to_owned();
                let slice = slices.remove(&batch_number).unwrap_or_default();
                batches_run += 1;
                workers.spawn(async move {
                    executor
                        .execute_batch(
                            &owned_key,
                            entity_type,
                            batch_number,
                            &slice,
                            processor.as_ref(),
                        )
                        .await
                });
            }

            while let Some(joined) = workers.join_next().await {
                self.on_batch_done(&mut tally, joined).await;
            }
            if let Some(e) = tally.first_error {
                return Err(e);
            }
            cursor = tally.cursor;

            let still_pending =
                self.store.get_pending_entity_batches(project_key, entity_type).await?;
            if !still_pending.is_empty() {
                return Err(MigrationError::IncompleteBatches {
                    entity_type,
                    pending: still_pending.len(),
                });
            }
            self.record_cursor(project_key, phase, cursor).await?;

            tracing::info!(
                project_key,
                phase = %phase,
                entity_type = %entity_type,
                total_batches,
                batches_run,
                "entity type completed"
            );
            reports.push(EntityTypeReport { entity_type, total_items, total_batches, batches_run });
        }
        Ok(reports)
    }

    async fn on_batch_done(
        &self,
        tally: &mut BatchTally<'_>,
        joined: Result<Result<BatchResult, MigrationError>, JoinError>,
    ) {
        let outcome = joined
            .map_err(|e| MigrationError::Worker(format!("batch task failed: {e}")))
            .and_then(|r| r);
        match outcome {
            Ok(result) => {
                let done = tally
                    .items_count
                    .get(&result.batch_number)
                    .copied()
                    .unwrap_or(result.processed_count);
                tally.cursor.processed_items += u64::from(done);
                if let Err(e) = self.record_cursor(tally.project_key, tally.phase, tally.cursor).await
                {
                    tally.fail(e);
                }
            },
            Err(e) => tally.fail(e),
        }
    }

    async fn record_cursor(
        &self,
        project_key: &str,
        phase: Phase,
        cursor: PhaseCursor,
    ) -> Result<(), MigrationError> {
        self.store
            .update_migration_state(
                project_key,
                MigrationStateUpdate::new().metadata(MetadataPatch::default().cursor(phase, cursor)),
            )
            .await?;
        Ok(())
    }
}

/// Loop state for one entity type's batch pool.
struct BatchTally<'a> {
    project_key: &'a str,
    phase: Phase,
    entity_type: EntityType,
    items_count: HashMap<u32, u32>,
    cursor: PhaseCursor,
    first_error: Option<MigrationError>,
}

impl BatchTally<'_> {
    /// Keeps the first failure; later ones are only logged.
    fn fail(&mut self, error: MigrationError) {
        if self.first_error.is_none() {
            self.first_error = Some(error);
        } else {
            tracing::warn!(
                project_key = self.project_key,
                entity_type = %self.entity_type,
                error = %error,
                "additional batch failure"
            );
        }
    }
}
