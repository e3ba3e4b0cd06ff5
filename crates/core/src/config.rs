//! Process-wide configuration, built once at startup and passed down explicitly.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_DB_POOL_SIZE, DEFAULT_MAX_WORKERS};
use crate::env_config::parse_with_default;
use crate::error::CoreError;

pub const ENV_BATCH_SIZE: &str = "ZTOQ_BATCH_SIZE";
pub const ENV_MAX_WORKERS: &str = "ZTOQ_MAX_WORKERS";
pub const ENV_RESUME_GRANULARITY: &str = "ZTOQ_RESUME_GRANULARITY";
pub const ENV_DATABASE_URL: &str = "ZTOQ_DATABASE_URL";
pub const ENV_DB_POOL_SIZE: &str = "ZTOQ_DB_POOL_SIZE";

/// Where a pending batch restarts after a failure or crash.
///
/// The store only records how many items of a batch succeeded, not which ones, so
/// `Item` relies on the batch's item slice being stable between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeGranularity {
    /// Skip the first `processed_count` items of the batch.
    #[default]
    Item,
    /// Re-run every item of the batch; processors must be idempotent.
    Batch,
}

impl ResumeGranularity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Item => "item",
            Self::Batch => "batch",
        }
    }
}

impl Display for ResumeGranularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResumeGranularity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "item" => Ok(Self::Item),
            "batch" => Ok(Self::Batch),
            _ => Err(CoreError::InvalidConfig(format!("resume granularity: {s}"))),
        }
    }
}

/// Location of the state store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Sqlite { path: PathBuf, pool_size: u32 },
    Postgres { url: String },
}

impl DatabaseConfig {
    /// Parses `sqlite:<path>` or a `postgres://` / `postgresql://` URL.
    pub fn parse(raw: &str, pool_size: u32) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix("sqlite:") {
            let path = rest.trim_start_matches("//");
            if path.is_empty() {
                return Err(CoreError::InvalidConfig(format!("sqlite URL missing path: {raw}")));
            }
            return Ok(Self::Sqlite { path: PathBuf::from(path), pool_size });
        }
        if raw.starts_with("postgres://") || raw.starts_with("postgresql://") {
            return Ok(Self::Postgres { url: raw.to_owned() });
        }
        Err(CoreError::InvalidConfig(format!("unsupported database URL: {raw}")))
    }

    /// `<local data dir>/ztoq/ztoq.db`, falling back to the working directory.
    #[must_use]
    pub fn default_sqlite_path() -> PathBuf {
        dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("ztoq").join("ztoq.db")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::Sqlite { path: Self::default_sqlite_path(), pool_size: DEFAULT_DB_POOL_SIZE }
    }
}

/// Settings for one migration process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub batch_size: usize,
    pub max_workers: usize,
    pub resume_granularity: ResumeGranularity,
    pub database: DatabaseConfig,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            resume_granularity: ResumeGranularity::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl MigrationConfig {
    /// Reads `ZTOQ_*` variables from the process environment.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from an arbitrary variable source.
    ///
    /// Unparsable numbers fall back to defaults with a warning; an unsupported database
    /// URL is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let batch_size =
            parse_with_default(ENV_BATCH_SIZE, lookup(ENV_BATCH_SIZE).as_deref(), DEFAULT_BATCH_SIZE);
        let max_workers = parse_with_default(
            ENV_MAX_WORKERS,
            lookup(ENV_MAX_WORKERS).as_deref(),
            DEFAULT_MAX_WORKERS,
        );
        let resume_granularity = parse_with_default(
            ENV_RESUME_GRANULARITY,
            lookup(ENV_RESUME_GRANULARITY).as_deref(),
            ResumeGranularity::default(),
        );
        let pool_size = parse_with_default(
            ENV_DB_POOL_SIZE,
            lookup(ENV_DB_POOL_SIZE).as_deref(),
            DEFAULT_DB_POOL_SIZE,
        );
        let database = match lookup(ENV_DATABASE_URL) {
            Some(url) if !url.trim().is_empty() => DatabaseConfig::parse(&url, pool_size)?,
            _ => DatabaseConfig::Sqlite {
                path: DatabaseConfig::default_sqlite_path(),
                pool_size,
            },
        };

        let config = Self { batch_size, max_workers, resume_granularity, database };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.batch_size == 0 {
            return Err(CoreError::InvalidConfig("batch_size must be greater than 0".to_owned()));
        }
        if self.max_workers == 0 {
            return Err(CoreError::InvalidConfig("max_workers must be greater than 0".to_owned()));
        }
        Ok(())
    }
}
