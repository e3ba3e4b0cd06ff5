//! Migration facade: sequences extraction, transformation and loading for one project.

use std::sync::Arc;

use serde::Serialize;
use ztoq_core::{MigrationConfig, MigrationStatus, Phase, SourceClient, TargetClient};
use ztoq_storage::StateStore;

use crate::controller::{PhaseController, PhaseReport};
use crate::error::MigrationError;
use crate::executor::ItemProcessor;
use crate::processors::{ExtractPhase, LoadPhase, TransformPhase};

/// Reports of every phase run by [`MigrationFacade::run_migration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub project_key: String,
    pub phases: Vec<PhaseReport>,
}

pub struct MigrationFacade {
    project_key: String,
    controller: PhaseController,
    extract: Arc<ExtractPhase>,
    transform: Arc<TransformPhase>,
    load: Arc<LoadPhase>,
}

impl MigrationFacade {
    /// # Errors
    /// [`MigrationError::State`] if `config` fails validation.
    pub fn new(
        project_key: impl Into<String>,
        config: &MigrationConfig,
        store: Arc<dyn StateStore>,
        source: Arc<dyn SourceClient>,
        target: Arc<dyn TargetClient>,
    ) -> Result<Self, MigrationError> {
        config.validate()?;
        let project_key = project_key.into();
        if project_key.trim().is_empty() {
            return Err(MigrationError::InvalidInput("project key must not be empty".to_owned()));
        }
        Ok(Self {
            project_key,
            controller: PhaseController::new(
                Arc::clone(&store),
                config.batch_size,
                config.max_workers,
                config.resume_granularity,
            ),
            extract: Arc::new(ExtractPhase::new(source, Arc::clone(&store))),
            transform: Arc::new(TransformPhase::new(Arc::clone(&store))),
            load: Arc::new(LoadPhase::new(target, store)),
        })
    }

    #[must_use]
    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    /// Extraction phase. The project is looked up before any folder is fetched, so
    /// a wrong key fails before a batch is planned.
    ///
    /// # Errors
    /// Any source or storage error; the phase is left `failed`.
    pub async fn extract_data(&self) -> Result<PhaseReport, MigrationError> {
        let processor: Arc<dyn ItemProcessor> = self.extract.clone();
        self.controller
            .run_phase(&self.project_key, Phase::Extraction, self.extract.as_ref(), processor)
            .await
    }

    /// # Errors
    /// [`MigrationError::PhaseOrder`] unless extraction has completed.
    pub async fn transform_data(&self) -> Result<PhaseReport, MigrationError> {
        self.require_predecessor(Phase::Transformation).await?;
        let processor: Arc<dyn ItemProcessor> = self.transform.clone();
        self.controller
            .run_phase(&self.project_key, Phase::Transformation, self.transform.as_ref(), processor)
            .await
    }

    /// # Errors
    /// [`MigrationError::PhaseOrder`] unless transformation has completed.
    pub async fn load_data(&self) -> Result<PhaseReport, MigrationError> {
        self.require_predecessor(Phase::Loading).await?;
        let processor: Arc<dyn ItemProcessor> = self.load.clone();
        self.controller
            .run_phase(&self.project_key, Phase::Loading, self.load.as_ref(), processor)
            .await
    }

    /// # Errors
    /// See the per-phase methods.
    pub async fn run_phase(&self, phase: Phase) -> Result<PhaseReport, MigrationError> {
        match phase {
            Phase::Extraction => self.extract_data().await,
            Phase::Transformation => self.transform_data().await,
            Phase::Loading => self.load_data().await,
        }
    }

    /// Runs every phase in order, stopping at the first failure.
    ///
    /// Completed phases are skipped, so re-running after a failure resumes from the
    /// failed phase.
    ///
    /// # Errors
    /// The failing phase's error, unchanged.
    pub async fn run_migration(&self) -> Result<MigrationReport, MigrationError> {
        tracing::info!(project_key = %self.project_key, "migration started");
        let mut phases = Vec::with_capacity(Phase::ORDERED.len());
        for phase in Phase::ORDERED {
            phases.push(self.run_phase(phase).await?);
        }
        tracing::info!(project_key = %self.project_key, "migration completed");
        Ok(MigrationReport { project_key: self.project_key.clone(), phases })
    }

    async fn require_predecessor(&self, phase: Phase) -> Result<(), MigrationError> {
        let Some(requires) = phase.predecessor() else {
            return Ok(());
        };
        let state = self.controller.state(&self.project_key).await?;
        if state.status(requires) == MigrationStatus::Completed {
            Ok(())
        } else {
            Err(MigrationError::PhaseOrder { phase, requires })
        }
    }
}
