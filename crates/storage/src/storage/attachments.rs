use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use super::{Storage, format_timestamp, get_conn, parse_timestamp};
use crate::error::StorageError;
use crate::types::StoredAttachment;

impl Storage {
    /// Insert or overwrite an attachment blob.
    ///
    /// # Errors
    /// Returns error if database upsert fails.
    pub fn save_attachment(
        &self,
        project_key: &str,
        attachment_id: &str,
        filename: &str,
        content_type: Option<&str>,
        content: &[u8],
    ) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let size = i64::try_from(content.len()).unwrap_or(i64::MAX);
        conn.execute(
            "INSERT INTO attachments
               (project_key, attachment_id, filename, content_type, content, size, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(project_key, attachment_id) DO UPDATE SET
                filename = excluded.filename,
                content_type = excluded.content_type,
                content = excluded.content,
                size = excluded.size",
            params![
                project_key,
                attachment_id,
                filename,
                content_type,
                content,
                size,
                format_timestamp(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_attachment(
        &self,
        project_key: &str,
        attachment_id: &str,
    ) -> Result<Option<StoredAttachment>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let attachment = conn
            .query_row(
                "SELECT project_key, attachment_id, filename, content_type, content, size, created_at
                   FROM attachments
                  WHERE project_key = ?1 AND attachment_id = ?2",
                params![project_key, attachment_id],
                |row| {
                    Ok(StoredAttachment {
                        project_key: row.get(0)?,
                        attachment_id: row.get(1)?,
                        filename: row.get(2)?,
                        content_type: row.get(3)?,
                        content: row.get(4)?,
                        size: u64::try_from(row.get::<_, i64>(5)?).unwrap_or(0),
                        created_at: parse_timestamp(6, &row.get::<_, String>(6)?)?,
                    })
                },
            )
            .optional()?;
        Ok(attachment)
    }
}
