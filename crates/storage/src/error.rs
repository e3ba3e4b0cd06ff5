//! Typed error enum for the storage layer.
//!
//! Lets callers match on specific failure modes (duplicate batch, not found,
//! transient DB errors) instead of downcasting opaque boxes.

use thiserror::Error;
use ztoq_core::EntityType;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Row not found for expected-present entity.
    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// A batch row for this `(project_key, entity_type, batch_number)` already exists.
    #[error("duplicate batch: {project_key}/{entity_type}/{batch_number}")]
    DuplicateBatch { project_key: String, entity_type: EntityType, batch_number: u32 },

    /// A batch update asked for a status change the state machine forbids.
    #[error("rejected batch update: {0}")]
    InvalidTransition(#[source] ztoq_core::CoreError),

    /// Any other unique constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// SQLite failure.
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    /// PostgreSQL / connection / timeout failure.
    #[cfg(feature = "postgres")]
    #[error("postgres error: {0}")]
    Postgres(#[source] sqlx::Error),

    /// Could not obtain a pooled connection.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Row data could not be deserialized into domain type.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Migration failure.
    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking storage task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Blocking(String),

    /// The configured backend is not compiled into this build.
    #[error("unsupported backend: {0}")]
    Unsupported(String),
}

impl StorageError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Pool(_) => true,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => {
                matches!(e.code, rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            },
            #[cfg(feature = "postgres")]
            Self::Postgres(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => true,
            _ => false,
        }
    }

    /// Whether this error is a unique-constraint violation.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateBatch { .. } | Self::Conflict(_))
    }
}

/// Custom `From<rusqlite::Error>`: constraint violations become `Conflict`.
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(msg.clone().unwrap_or_else(|| err.to_string()))
            },
            _ => Self::Sqlite(err),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        Self::Pool(err.to_string())
    }
}

/// Custom `From<sqlx::Error>`: NOT blanket `#[from]`.
///
/// - `RowNotFound` → `NotFound` (generic; callers should catch and remap with entity context)
/// - SQLSTATE 23505 → `Conflict`
/// - Everything else → `Postgres`
#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound { entity: "row", id: "unknown".into() },
            sqlx::Error::Database(db_err) if db_err.code().is_some_and(|c| c == "23505") => {
                Self::Conflict(db_err.message().to_owned())
            },
            _ => Self::Postgres(err),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataCorruption {
            context: "JSON serialization/deserialization".to_owned(),
            source: Box::new(err),
        }
    }
}

impl From<ztoq_core::CoreError> for StorageError {
    fn from(err: ztoq_core::CoreError) -> Self {
        Self::DataCorruption { context: "stored enum value".to_owned(), source: Box::new(err) }
    }
}
