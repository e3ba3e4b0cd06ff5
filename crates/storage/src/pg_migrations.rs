//! PostgreSQL schema for the ztoq state store.
//!
//! Every statement is idempotent, so running this on each connect is safe.

use sqlx::PgPool;

use crate::error::StorageError;

const STATEMENTS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS migration_state (
        project_key TEXT PRIMARY KEY,
        extraction_status TEXT NOT NULL DEFAULT 'not_started',
        transformation_status TEXT NOT NULL DEFAULT 'not_started',
        loading_status TEXT NOT NULL DEFAULT 'not_started',
        error_message TEXT,
        metadata JSONB NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS entity_batch_state (
        id BIGSERIAL PRIMARY KEY,
        project_key TEXT NOT NULL,
        entity_type TEXT NOT NULL,
        batch_number INTEGER NOT NULL,
        total_batches INTEGER NOT NULL,
        items_count INTEGER NOT NULL,
        processed_count INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'not_started',
        started_at TIMESTAMPTZ,
        completed_at TIMESTAMPTZ,
        error_message TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (project_key, entity_type, batch_number),
        CHECK (processed_count >= 0 AND processed_count <= items_count)
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_batch_project_type ON entity_batch_state (project_key, entity_type)",
    "CREATE INDEX IF NOT EXISTS idx_batch_status ON entity_batch_state (project_key, entity_type, status)",
    r"
    CREATE TABLE IF NOT EXISTS staged_entities (
        seq BIGSERIAL PRIMARY KEY,
        project_key TEXT NOT NULL,
        entity_type TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        payload JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (project_key, entity_type, entity_id)
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS entity_mappings (
        id BIGSERIAL PRIMARY KEY,
        project_key TEXT NOT NULL,
        mapping_type TEXT NOT NULL,
        source_id TEXT NOT NULL,
        target_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (project_key, mapping_type, source_id)
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS attachments (
        project_key TEXT NOT NULL,
        attachment_id TEXT NOT NULL,
        filename TEXT NOT NULL,
        content_type TEXT,
        content BYTEA NOT NULL,
        size BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (project_key, attachment_id)
    )
    ",
];

/// Run all PostgreSQL migrations.
pub(crate) async fn run_pg_migrations(pool: &PgPool) -> Result<(), StorageError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;
    }
    tracing::debug!(statements = STATEMENTS.len(), "PostgreSQL schema ensured");
    Ok(())
}
