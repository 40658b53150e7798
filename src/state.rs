use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::content::ContentService;
use crate::repository::{DynRepository, SqliteRepository};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub repo: DynRepository,
    pub content: ContentService,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let repo: DynRepository = Arc::new(SqliteRepository::new(db.clone()));
        Self {
            content: ContentService::new(repo.clone()),
            repo,
            db,
            config,
        }
    }
}
