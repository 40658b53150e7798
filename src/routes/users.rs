use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::create_session;
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::repository::{SettingsRepository, UserRepository};
use crate::state::AppState;

// --- Payloads ---

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub bio: String,
    /// Honoured only when an admin is registering the account.
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub bio: Option<String>,
}

#[derive(Serialize)]
pub struct Registered {
    pub user: User,
    pub token: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register))
        .route("/users/me", get(me).patch(update_me))
        .route("/users/{id}", get(get_user).delete(delete_user))
}

// --- Handlers ---

async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.repo.list_users().await?))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<User>> {
    let user = state.repo.find_user(&id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

async fn register(
    State(state): State<AppState>,
    caller: MaybeUser,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Registered>)> {
    let caller_is_admin = caller.is_admin();
    if !caller_is_admin && !state.repo.load_settings().await?.allow_registrations {
        return Err(AppError::Forbidden);
    }

    let now = Utc::now();
    let user = User {
        id: uuid::Uuid::now_v7().to_string(),
        username: req.username,
        email: req.email,
        bio: req.bio,
        is_admin: caller_is_admin && req.is_admin,
        date_joined: now,
        updated_at: now,
    };
    let user = state.content.save_user(user, now).await?;
    let token = create_session(&state.db, &user.id, state.config.auth.session_hours)?;

    Ok((StatusCode::CREATED, Json(Registered { user, token })))
}

async fn me(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<User>> {
    let user = state
        .repo
        .find_user(&current.id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

async fn update_me(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    let mut user = state
        .repo
        .find_user(&current.id)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(email) = req.email {
        user.email = email;
    }
    if let Some(bio) = req.bio {
        user.bio = bio;
    }

    Ok(Json(state.content.save_user(user, Utc::now()).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    current.require_admin()?;
    if !state.repo.delete_user(&id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!("User {} deleted by {}", id, current.username);
    Ok(StatusCode::NO_CONTENT)
}
