use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::db::models::{Comment, CommentView};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::repository::CommentRepository;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CommentQuery {
    pub post: Option<String>,
}

#[derive(Deserialize)]
pub struct NewComment {
    pub post: String,
    pub parent: Option<String>,
    pub content: String,
}

#[derive(Deserialize)]
pub struct CommentUpdate {
    pub content: Option<String>,
    pub is_approved: Option<bool>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comments", get(list_comments).post(create_comment))
        .route(
            "/comments/{id}",
            get(get_comment).patch(update_comment).delete(delete_comment),
        )
}

async fn list_comments(
    State(state): State<AppState>,
    caller: MaybeUser,
    Query(query): Query<CommentQuery>,
) -> AppResult<Json<Vec<CommentView>>> {
    let post = query.post.as_deref().map(str::trim).filter(|p| !p.is_empty());
    Ok(Json(state.repo.list_comments(post, caller.is_admin()).await?))
}

async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<NewComment>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let now = Utc::now();
    let comment = Comment {
        id: uuid::Uuid::now_v7().to_string(),
        post_id: req.post,
        author_id: user.id,
        parent_id: req.parent.filter(|p| !p.trim().is_empty()),
        content: req.content,
        // Admin comments skip moderation
        is_approved: user.is_admin,
        created_at: now,
        updated_at: now,
    };

    let comment = state.content.save_comment(comment, now).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn find_comment(state: &AppState, id: &str) -> AppResult<Comment> {
    state.repo.find_comment(id).await?.ok_or(AppError::NotFound)
}

async fn get_comment(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Json<Comment>> {
    let comment = find_comment(&state, &id).await?;
    let visible = comment.is_approved
        || user
            .as_ref()
            .is_some_and(|u| u.can_modify(&comment.author_id));
    if !visible {
        return Err(AppError::NotFound);
    }
    Ok(Json(comment))
}

async fn update_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CommentUpdate>,
) -> AppResult<Json<Comment>> {
    let mut comment = find_comment(&state, &id).await?;
    if !user.can_modify(&comment.author_id) {
        return Err(AppError::Forbidden);
    }

    if let Some(approved) = req.is_approved {
        user.require_admin()?;
        comment.is_approved = approved;
    }
    if let Some(content) = req.content {
        comment.content = content;
    }

    Ok(Json(state.content.save_comment(comment, Utc::now()).await?))
}

async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let comment = find_comment(&state, &id).await?;
    if !user.can_modify(&comment.author_id) {
        return Err(AppError::Forbidden);
    }
    state.repo.delete_comment(&comment.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
