//! Shared constants for ztoq.

/// Default number of source items per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default size of the batch worker pool.
pub const DEFAULT_MAX_WORKERS: usize = 5;

/// Default SQLite connection pool size.
pub const DEFAULT_DB_POOL_SIZE: u32 = 8;

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 20;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// Page size requested from paginated source endpoints.
pub const SOURCE_PAGE_SIZE: usize = 100;

/// Maximum stored length of a persisted error message.
pub const MAX_ERROR_MESSAGE_LEN: usize = 4000;
