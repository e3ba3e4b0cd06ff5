//! Storage types shared across modules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attachment bytes kept in the blob store, keyed by `(project_key, attachment_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAttachment {
    pub project_key: String,
    pub attachment_id: String,
    pub filename: String,
    pub content_type: Option<String>,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}
