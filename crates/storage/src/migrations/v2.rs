//! Migration v2: staging area, entity mappings and attachment blobs

pub(super) const SQL: &str = "
CREATE TABLE IF NOT EXISTS staged_entities (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    project_key TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    payload TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (project_key, entity_type, entity_id)
);

CREATE TABLE IF NOT EXISTS entity_mappings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_key TEXT NOT NULL,
    mapping_type TEXT NOT NULL,
    source_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (project_key, mapping_type, source_id)
);

CREATE TABLE IF NOT EXISTS attachments (
    project_key TEXT NOT NULL,
    attachment_id TEXT NOT NULL,
    filename TEXT NOT NULL,
    content_type TEXT,
    content BLOB NOT NULL,
    size INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (project_key, attachment_id)
);

CREATE INDEX IF NOT EXISTS idx_staged_project_type ON staged_entities(project_key, entity_type);
CREATE INDEX IF NOT EXISTS idx_mappings_project ON entity_mappings(project_key, mapping_type);
";
