//! AttachmentStore implementation for PgStorage.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::PgStorage;
use crate::error::StorageError;
use crate::traits::AttachmentStore;
use crate::types::StoredAttachment;

#[async_trait]
impl AttachmentStore for PgStorage {
    async fn save_attachment(
        &self,
        project_key: &str,
        attachment_id: &str,
        filename: &str,
        content_type: Option<&str>,
        content: &[u8],
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO attachments
               (project_key, attachment_id, filename, content_type, content, size, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (project_key, attachment_id) DO UPDATE SET
                filename = EXCLUDED.filename,
                content_type = EXCLUDED.content_type,
                content = EXCLUDED.content,
                size = EXCLUDED.size",
        )
        .bind(project_key)
        .bind(attachment_id)
        .bind(filename)
        .bind(content_type)
        .bind(content)
        .bind(i64::try_from(content.len()).unwrap_or(i64::MAX))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_attachment(
        &self,
        project_key: &str,
        attachment_id: &str,
    ) -> Result<Option<StoredAttachment>, StorageError> {
        let row = sqlx::query(
            "SELECT project_key, attachment_id, filename, content_type, content, size, created_at
               FROM attachments
              WHERE project_key = $1 AND attachment_id = $2",
        )
        .bind(project_key)
        .bind(attachment_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(StoredAttachment {
            project_key: row.try_get("project_key")?,
            attachment_id: row.try_get("attachment_id")?,
            filename: row.try_get("filename")?,
            content_type: row.try_get("content_type")?,
            content: row.try_get("content")?,
            size: u64::try_from(row.try_get::<i64, _>("size")?).unwrap_or(0),
            created_at: row.try_get("created_at")?,
        }))
    }
}
