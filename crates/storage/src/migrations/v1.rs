//! Migration v1: phase status and batch checkpoints

pub(super) const SQL: &str = "
CREATE TABLE IF NOT EXISTS migration_state (
    project_key TEXT PRIMARY KEY,
    extraction_status TEXT NOT NULL DEFAULT 'not_started',
    transformation_status TEXT NOT NULL DEFAULT 'not_started',
    loading_status TEXT NOT NULL DEFAULT 'not_started',
    error_message TEXT,
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS entity_batch_state (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_key TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    batch_number INTEGER NOT NULL,
    total_batches INTEGER NOT NULL,
    items_count INTEGER NOT NULL,
    processed_count INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'not_started',
    started_at TEXT,
    completed_at TEXT,
    error_message TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (project_key, entity_type, batch_number),
    CHECK (processed_count >= 0 AND processed_count <= items_count)
);

CREATE INDEX IF NOT EXISTS idx_batches_project_type ON entity_batch_state(project_key, entity_type);
CREATE INDEX IF NOT EXISTS idx_batches_status ON entity_batch_state(project_key, entity_type, status);
";
