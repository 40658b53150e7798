// Repository pattern - isolates all database side effects
mod categories;
mod comments;
mod contact;
mod posts;
mod settings;
mod tags;
mod users;

use std::sync::Arc;

use thiserror::Error;

use crate::state::DbPool;

pub use categories::CategoryRepository;
pub use comments::CommentRepository;
pub use contact::ContactRepository;
pub use posts::PostRepository;
pub use settings::SettingsRepository;
pub use tags::TagRepository;
pub use users::UserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    /// Raw SQLite failure, including unique and foreign key violations.
    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl RepositoryError {
    /// True when SQLite rejected the write because of a constraint (unique, foreign key, check).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            RepositoryError::Sql(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

/// Every storage capability the content service needs.
pub trait Repository:
    UserRepository
    + CategoryRepository
    + TagRepository
    + PostRepository
    + CommentRepository
    + ContactRepository
    + SettingsRepository
{
}

impl<T> Repository for T where
    T: UserRepository
        + CategoryRepository
        + TagRepository
        + PostRepository
        + CommentRepository
        + ContactRepository
        + SettingsRepository
{
}

/// Type alias for Arc-wrapped repository (for AppState)
pub type DynRepository = Arc<dyn Repository>;

/// SQLite implementation of every repository trait
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}
