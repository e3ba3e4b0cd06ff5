//! REST clients for the systems ztoq migrates between
//!
//! [`ZephyrClient`] implements the source trait against Zephyr Scale Cloud v2 and
//! [`QTestClient`] implements the target trait against qTest Manager v3. Both retry
//! transient failures (connection errors, 429 and 5xx) with a short backoff.

mod error;
mod http;
mod qtest;
mod zephyr;

pub use error::ClientError;
pub use http::{DEFAULT_TIMEOUT_SECS, truncate};
pub use qtest::QTestClient;
pub use zephyr::{DEFAULT_ZEPHYR_BASE_URL, ZephyrClient};
