use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use super::{RepositoryError, SqliteRepository};
use crate::db::models::ContactMessage;

const CONTACT_COLUMNS: &str = "id, name, email, subject, message, is_read, created_at";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<ContactMessage> {
    Ok(ContactMessage {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        subject: row.get(3)?,
        message: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn save_contact_message(&self, message: &ContactMessage)
        -> Result<(), RepositoryError>;

    async fn find_contact_message(
        &self,
        id: &str,
    ) -> Result<Option<ContactMessage>, RepositoryError>;

    /// Newest first.
    async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>, RepositoryError>;

    async fn delete_contact_message(&self, id: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
impl ContactRepository for SqliteRepository {
    async fn save_contact_message(
        &self,
        message: &ContactMessage,
    ) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO contact_messages (id, name, email, subject, message, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET is_read = excluded.is_read",
            params![
                message.id,
                message.name,
                message.email,
                message.subject,
                message.message,
                message.is_read,
                message.created_at
            ],
        )?;

        Ok(())
    }

    async fn find_contact_message(
        &self,
        id: &str,
    ) -> Result<Option<ContactMessage>, RepositoryError> {
        let conn = self.pool.get()?;
        let message = conn
            .query_row(
                &format!("SELECT {} FROM contact_messages WHERE id = ?1", CONTACT_COLUMNS),
                params![id],
                message_from_row,
            )
            .optional()?;
        Ok(message)
    }

    async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM contact_messages ORDER BY created_at DESC, id DESC",
            CONTACT_COLUMNS
        ))?;
        let messages = stmt
            .query_map([], message_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    async fn delete_contact_message(&self, id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM contact_messages WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
