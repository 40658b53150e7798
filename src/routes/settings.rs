use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::db::models::SiteSettings;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::repository::SettingsRepository;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct SettingsInput {
    pub site_name: Option<String>,
    pub admin_email: Option<String>,
    pub posts_per_page: Option<i64>,
    pub maintenance_mode: Option<bool>,
    pub allow_registrations: Option<bool>,
}

impl SettingsInput {
    fn apply(self, settings: &mut SiteSettings) {
        if let Some(v) = self.site_name {
            settings.site_name = v;
        }
        if let Some(v) = self.admin_email {
            settings.admin_email = v;
        }
        if let Some(v) = self.posts_per_page {
            settings.posts_per_page = v;
        }
        if let Some(v) = self.maintenance_mode {
            settings.maintenance_mode = v;
        }
        if let Some(v) = self.allow_registrations {
            settings.allow_registrations = v;
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/settings",
        get(get_settings).put(save_settings).patch(save_settings),
    )
}

async fn get_settings(State(state): State<AppState>) -> AppResult<Json<SiteSettings>> {
    Ok(Json(state.repo.load_settings().await?))
}

/// Fields left out of the body keep their current values.
async fn save_settings(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<SettingsInput>,
) -> AppResult<Json<SiteSettings>> {
    user.require_admin()?;
    let mut settings = state.repo.load_settings().await?;
    input.apply(&mut settings);
    Ok(Json(state.content.save_settings(settings, Utc::now()).await?))
}
