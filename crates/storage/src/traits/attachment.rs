use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::StoredAttachment;

/// Blob store for downloaded attachments.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Insert or overwrite the blob for `(project_key, attachment_id)`.
    async fn save_attachment(
        &self,
        project_key: &str,
        attachment_id: &str,
        filename: &str,
        content_type: Option<&str>,
        content: &[u8],
    ) -> Result<(), StorageError>;

    async fn get_attachment(
        &self,
        project_key: &str,
        attachment_id: &str,
    ) -> Result<Option<StoredAttachment>, StorageError>;
}
