use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use super::{RepositoryError, SqliteRepository};
use crate::db::models::SiteSettings;

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// The stored settings, or defaults when nothing has been saved yet.
    async fn load_settings(&self) -> Result<SiteSettings, RepositoryError>;

    /// Write the single settings row, creating it on first save.
    async fn save_settings(&self, settings: &SiteSettings) -> Result<(), RepositoryError>;
}

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn load_settings(&self) -> Result<SiteSettings, RepositoryError> {
        let conn = self.pool.get()?;
        let settings = conn
            .query_row(
                "SELECT site_name, admin_email, posts_per_page, maintenance_mode,
                        allow_registrations, updated_at
                 FROM site_settings WHERE id = 1",
                [],
                |row| {
                    Ok(SiteSettings {
                        site_name: row.get(0)?,
                        admin_email: row.get(1)?,
                        posts_per_page: row.get(2)?,
                        maintenance_mode: row.get(3)?,
                        allow_registrations: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(settings.unwrap_or_default())
    }

    async fn save_settings(&self, settings: &SiteSettings) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO site_settings (id, site_name, admin_email, posts_per_page,
                                        maintenance_mode, allow_registrations, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
               site_name = excluded.site_name,
               admin_email = excluded.admin_email,
               posts_per_page = excluded.posts_per_page,
               maintenance_mode = excluded.maintenance_mode,
               allow_registrations = excluded.allow_registrations,
               updated_at = excluded.updated_at",
            params![
                settings.site_name,
                settings.admin_email,
                settings.posts_per_page,
                settings.maintenance_mode,
                settings.allow_registrations,
                settings.updated_at
            ],
        )?;

        Ok(())
    }
}
