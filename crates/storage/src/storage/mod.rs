//! `SQLite` storage implementation
//!
//! All methods are synchronous; `sqlite_async` lifts them onto the async store traits.
//! Every operation checks a connection out of the pool, so concurrent batch workers
//! never share a transactional handle.

mod attachments;
mod batches;
mod mappings;
mod migration_state;
mod staging;

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use rusqlite::types::Type;

use crate::error::StorageError;
use crate::migrations;

/// Type alias for pooled connection
pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Main storage struct wrapping `SQLite` connection pool
#[derive(Clone, Debug)]
pub struct Storage {
    pub(crate) pool: Pool<SqliteConnectionManager>,
}

/// Get a connection from the pool
pub(crate) fn get_conn(pool: &Pool<SqliteConnectionManager>) -> Result<PooledConn, StorageError> {
    pool.get().map_err(|e| StorageError::Pool(format!("failed to get connection from pool: {e}")))
}

/// Parse JSON from a TEXT column, converting error to rusqlite error
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    idx: usize,
    s: &str,
) -> rusqlite::Result<T> {
    serde_json::from_str(s).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse an enum stored as TEXT
pub(crate) fn parse_text<T>(idx: usize, s: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    s.parse().map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse an RFC 3339 timestamp stored as TEXT
pub(crate) fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_opt_timestamp(
    idx: usize,
    s: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.map(|s| parse_timestamp(idx, &s)).transpose()
}

pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Custom connection initializer for concurrency settings
fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA busy_timeout = 30000;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

impl Storage {
    /// Create new storage instance with `SQLite` connection pool
    pub fn new(db_path: &Path, pool_size: u32) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Pool(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(init_connection);
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        // Run migrations on first connection
        let conn = get_conn(&pool)?;
        migrations::run_migrations(&conn).map_err(|e| StorageError::Migration(e.to_string()))?;
        drop(conn);

        tracing::info!(pool_size, path = %db_path.display(), "Storage initialized with connection pool");

        Ok(Self { pool })
    }
}
