//! PostgreSQL storage backend using sqlx.
//!
//! Split into modular files by store trait. Read-modify-write operations lock the
//! row with `SELECT ... FOR UPDATE` inside a transaction.

mod attachments;
mod batches;
mod mappings;
mod staging;
mod state;

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use ztoq_core::{PG_POOL_ACQUIRE_TIMEOUT_SECS, PG_POOL_IDLE_TIMEOUT_SECS, PG_POOL_MAX_CONNECTIONS};

use super::pg_migrations::run_pg_migrations;
use crate::error::StorageError;

#[derive(Clone, Debug)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_POOL_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        run_pg_migrations(&pool).await?;
        tracing::info!("PgStorage initialized");
        Ok(Self { pool })
    }
}

/// Counters are `u32` in the domain and `INTEGER` in the schema.
pub(crate) fn u32_to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

pub(crate) fn i32_to_u32(v: i32) -> u32 {
    u32::try_from(v).unwrap_or(0)
}
