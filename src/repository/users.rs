use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use super::{RepositoryError, SqliteRepository};
use crate::db::models::User;

const USER_COLUMNS: &str = "id, username, email, bio, is_admin, date_joined, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        bio: row.get(3)?,
        is_admin: row.get(4)?,
        date_joined: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or update by id. Duplicate usernames/emails fail with the SQLite constraint error.
    async fn save_user(&self, user: &User) -> Result<(), RepositoryError>;

    async fn find_user(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<User>, RepositoryError>;

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;

    async fn delete_user(&self, id: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn save_user(&self, user: &User) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO users (id, username, email, bio, is_admin, date_joined, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
               username = excluded.username,
               email = excluded.email,
               bio = excluded.bio,
               is_admin = excluded.is_admin,
               updated_at = excluded.updated_at",
            params![
                user.id,
                user.username,
                user.email,
                user.bio,
                user.is_admin,
                user.date_joined,
                user.updated_at
            ],
        )?;

        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
