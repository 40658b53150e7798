use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::db::models::ContactMessage;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::repository::ContactRepository;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Deserialize)]
pub struct MarkRead {
    pub is_read: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contact", get(list_messages).post(submit))
        .route(
            "/contact/{id}",
            get(get_message).patch(mark_read).delete(delete_message),
        )
}

/// Open to anonymous visitors.
async fn submit(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> AppResult<(StatusCode, Json<ContactMessage>)> {
    let message = ContactMessage {
        id: uuid::Uuid::now_v7().to_string(),
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        subject: form.subject.trim().to_string(),
        message: form.message,
        is_read: false,
        created_at: Utc::now(),
    };
    let message = state.content.save_contact_message(message).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_messages(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<ContactMessage>>> {
    user.require_admin()?;
    Ok(Json(state.repo.list_contact_messages().await?))
}

async fn find_message(state: &AppState, id: &str) -> AppResult<ContactMessage> {
    state
        .repo
        .find_contact_message(id)
        .await?
        .ok_or(AppError::NotFound)
}

async fn get_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ContactMessage>> {
    user.require_admin()?;
    Ok(Json(find_message(&state, &id).await?))
}

async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<MarkRead>,
) -> AppResult<Json<ContactMessage>> {
    user.require_admin()?;
    let mut message = find_message(&state, &id).await?;
    message.is_read = req.is_read;
    Ok(Json(state.content.save_contact_message(message).await?))
}

async fn delete_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    if !state.repo.delete_contact_message(&id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
