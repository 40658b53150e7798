use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use super::{RepositoryError, SqliteRepository};
use crate::db::models::{Comment, CommentView};

const COMMENT_COLUMNS: &str =
    "cm.id, cm.post_id, cm.author_id, cm.parent_id, cm.content, cm.is_approved, cm.created_at, cm.updated_at";

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        parent_id: row.get(3)?,
        content: row.get(4)?,
        is_approved: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn save_comment(&self, comment: &Comment) -> Result<(), RepositoryError>;

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, RepositoryError>;

    /// Oldest first. Unapproved comments are skipped unless `include_unapproved`.
    async fn list_comments(
        &self,
        post_id: Option<&str>,
        include_unapproved: bool,
    ) -> Result<Vec<CommentView>, RepositoryError>;

    async fn delete_comment(&self, id: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
impl CommentRepository for SqliteRepository {
    async fn save_comment(&self, comment: &Comment) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO comments (id, post_id, author_id, parent_id, content, is_approved, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
               content = excluded.content,
               is_approved = excluded.is_approved,
               updated_at = excluded.updated_at",
            params![
                comment.id,
                comment.post_id,
                comment.author_id,
                comment.parent_id,
                comment.content,
                comment.is_approved,
                comment.created_at,
                comment.updated_at
            ],
        )?;

        Ok(())
    }

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, RepositoryError> {
        let conn = self.pool.get()?;
        let comment = conn
            .query_row(
                &format!("SELECT {} FROM comments cm WHERE cm.id = ?1", COMMENT_COLUMNS),
                params![id],
                comment_from_row,
            )
            .optional()?;
        Ok(comment)
    }

    async fn list_comments(
        &self,
        post_id: Option<&str>,
        include_unapproved: bool,
    ) -> Result<Vec<CommentView>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, u.username FROM comments cm
             JOIN users u ON u.id = cm.author_id
             WHERE (?1 IS NULL OR cm.post_id = ?1)
               AND (cm.is_approved = 1 OR ?2)
             ORDER BY cm.created_at, cm.id",
            COMMENT_COLUMNS
        ))?;

        let comments = stmt
            .query_map(params![post_id, include_unapproved], |row| {
                let comment = comment_from_row(row)?;
                Ok(CommentView {
                    is_reply: comment.is_reply(),
                    comment,
                    author_username: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    async fn delete_comment(&self, id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
