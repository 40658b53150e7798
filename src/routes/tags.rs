use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::db::models::Tag;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::repository::TagRepository;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TagInput {
    pub name: Option<String>,
    pub slug: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route(
            "/tags/{slug}",
            get(get_tag)
                .put(update_tag)
                .patch(update_tag)
                .delete(delete_tag),
        )
}

async fn list_tags(State(state): State<AppState>) -> AppResult<Json<Vec<Tag>>> {
    Ok(Json(state.repo.list_tags().await?))
}

async fn create_tag(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<TagInput>,
) -> AppResult<(StatusCode, Json<Tag>)> {
    let name = input
        .name
        .ok_or_else(|| AppError::BadRequest("name is required".into()))?;
    let tag = Tag {
        id: uuid::Uuid::now_v7().to_string(),
        name,
        slug: input.slug.unwrap_or_default(),
        created_at: Utc::now(),
    };

    let tag = state.content.save_tag(tag).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn find_by_slug(state: &AppState, slug: &str) -> AppResult<Tag> {
    state
        .repo
        .find_tag_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound)
}

async fn get_tag(State(state): State<AppState>, Path(slug): Path<String>) -> AppResult<Json<Tag>> {
    Ok(Json(find_by_slug(&state, &slug).await?))
}

// A tag has only name and slug, so PUT and PATCH share one handler
async fn update_tag(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Json(input): Json<TagInput>,
) -> AppResult<Json<Tag>> {
    user.require_admin()?;
    let mut tag = find_by_slug(&state, &slug).await?;
    if let Some(name) = input.name {
        tag.name = name;
    }
    if let Some(slug) = input.slug {
        tag.slug = slug;
    }
    Ok(Json(state.content.save_tag(tag).await?))
}

async fn delete_tag(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    let tag = find_by_slug(&state, &slug).await?;
    state.repo.delete_tag(&tag.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
