//! Versioned SQLite schema, tracked through `PRAGMA user_version`.

mod v1;
mod v2;

use rusqlite::Connection;

/// Ordered `(version, description, sql)` steps; each runs once.
const STEPS: &[(i32, &str, &str)] = &[
    (1, "migration_state and entity_batch_state", v1::SQL),
    (2, "staged_entities, entity_mappings and attachments", v2::SQL),
];

pub const SCHEMA_VERSION: i32 = 2;

/// Applies every step newer than the stored version, then records [`SCHEMA_VERSION`].
pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    let current: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if current >= SCHEMA_VERSION {
        tracing::debug!(version = current, "state store schema up to date");
        return Ok(());
    }

    for &(version, description, sql) in STEPS.iter().filter(|(v, _, _)| *v > current) {
        tracing::info!(version, description, "applying state store migration");
        conn.execute_batch(sql)?;
    }
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tracing::info!(from = current, to = SCHEMA_VERSION, "state store schema migrated");
    Ok(())
}
