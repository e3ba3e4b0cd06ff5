//! Resumable extract/transform/load engine for ztoq.
//!
//! Each phase fetches an entity type's items, slices them into batches registered in
//! the state store, and runs pending batches on a bounded worker pool. Batch and phase
//! rows are the only resume state, so a rerun after a crash or failure picks up where
//! the last one stopped.

pub mod controller;
pub mod error;
pub mod executor;
pub mod facade;
pub mod planner;
pub mod processors;
pub mod transform;

pub use controller::{EntityFetcher, EntityTypeReport, PhaseController, PhaseReport};
pub use error::MigrationError;
pub use executor::{BatchExecutor, BatchResult, ItemProcessor};
pub use facade::{MigrationFacade, MigrationReport};
pub use planner::{PlannedBatch, plan_batches};

#[cfg(test)]
mod tests;
