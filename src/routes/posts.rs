use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::content::{PostFilter, PostStatus};
use crate::db::models::{Post, PostView};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::repository::{CategoryRepository, PostRepository, TagRepository};
use crate::state::AppState;

// --- Payloads ---

/// Listing filters. Anything missing, empty or unparseable is ignored.
#[derive(Deserialize, Default)]
pub struct PostQuery {
    pub category: Option<String>,
    pub author: Option<String>,
    pub status: Option<String>,
    pub tag: Option<String>,
}

impl PostQuery {
    pub fn into_filter(self) -> PostFilter {
        PostFilter::from_params(
            self.category.as_deref(),
            self.author.as_deref(),
            self.tag.as_deref(),
            self.status.as_deref(),
        )
    }
}

/// Writable post fields. `published_date`, counters and author are never read from input.
#[derive(Deserialize, Default)]
pub struct PostInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<String>,
    /// Category slug; empty string clears the category.
    pub category: Option<String>,
    /// Tag slugs; replaces the whole set when present.
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Serialize)]
pub struct Likes {
    pub likes: i64,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/featured", get(featured_posts))
        .route(
            "/posts/{slug}",
            get(get_post)
                .put(replace_post)
                .patch(update_post)
                .delete(delete_post),
        )
        .route("/posts/{slug}/like", post(like_post))
}

// --- Handlers ---

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> AppResult<Json<Vec<PostView>>> {
    Ok(Json(state.repo.list_posts(&query.into_filter()).await?))
}

async fn featured_posts(State(state): State<AppState>) -> AppResult<Json<Vec<PostView>>> {
    Ok(Json(state.repo.list_posts(&PostFilter::featured()).await?))
}

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<PostInput>,
) -> AppResult<(StatusCode, Json<PostView>)> {
    let now = Utc::now();
    let mut post = Post {
        id: uuid::Uuid::now_v7().to_string(),
        title: String::new(),
        slug: String::new(),
        content: String::new(),
        excerpt: String::new(),
        author_id: user.id,
        category_id: None,
        tag_ids: Vec::new(),
        status: PostStatus::Draft,
        is_active: true,
        published_date: None,
        view_count: 0,
        likes: 0,
        created_at: now,
        updated_at: now,
    };
    apply_input(&state, &mut post, input, true).await?;

    let post = state.content.save_post(post, now).await?;
    Ok((StatusCode::CREATED, Json(load_view(&state, &post.slug).await?)))
}

async fn get_post(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
) -> AppResult<Json<PostView>> {
    let mut view = load_view(&state, &slug).await?;
    let can_see_hidden = user
        .as_ref()
        .is_some_and(|u| u.can_modify(&view.post.author_id));
    if !view.post.is_active && !can_see_hidden {
        return Err(AppError::NotFound);
    }

    state.repo.record_view(&view.post.id).await?;
    view.post.view_count += 1;
    Ok(Json(view))
}

async fn replace_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Json(input): Json<PostInput>,
) -> AppResult<Json<PostView>> {
    if input.title.is_none() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    write_post(state, user, slug, input, true).await
}

async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Json(input): Json<PostInput>,
) -> AppResult<Json<PostView>> {
    write_post(state, user, slug, input, false).await
}

async fn write_post(
    state: AppState,
    user: CurrentUser,
    slug: String,
    input: PostInput,
    replace: bool,
) -> AppResult<Json<PostView>> {
    let mut post = find_owned(&state, &user, &slug).await?;
    apply_input(&state, &mut post, input, replace).await?;

    let post = state.content.save_post(post, Utc::now()).await?;
    Ok(Json(load_view(&state, &post.slug).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    let post = find_owned(&state, &user, &slug).await?;
    state.repo.delete_post(&post.id).await?;
    tracing::info!("Post {} deleted by {}", post.slug, user.username);
    Ok(StatusCode::NO_CONTENT)
}

async fn like_post(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Likes>> {
    let post = state
        .repo
        .find_post_by_slug(&slug)
        .await?
        .ok_or(AppError::NotFound)?;
    let likes = state.repo.add_like(&post.id).await?;
    Ok(Json(Likes { likes }))
}

// --- Helpers ---

async fn load_view(state: &AppState, slug: &str) -> AppResult<PostView> {
    state
        .repo
        .find_post_view(slug)
        .await?
        .ok_or(AppError::NotFound)
}

/// Load a post the caller may modify: its author or an admin.
async fn find_owned(state: &AppState, user: &CurrentUser, slug: &str) -> AppResult<Post> {
    let post = state
        .repo
        .find_post_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound)?;
    if !user.can_modify(&post.author_id) {
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

/// Copy input onto `post`, resolving category and tag slugs to ids.
/// With `replace`, omitted optional fields reset to their defaults.
async fn apply_input(
    state: &AppState,
    post: &mut Post,
    input: PostInput,
    replace: bool,
) -> AppResult<()> {
    if let Some(title) = input.title {
        post.title = title;
    }
    if let Some(slug) = input.slug {
        post.slug = slug;
    }
    match input.content {
        Some(content) => post.content = content,
        None if replace => post.content = String::new(),
        None => {}
    }
    match input.excerpt {
        Some(excerpt) => post.excerpt = excerpt,
        None if replace => post.excerpt = String::new(),
        None => {}
    }
    match input.status {
        Some(status) => post.status = status.trim().parse()?,
        None if replace => post.status = PostStatus::Draft,
        None => {}
    }
    match input.is_active {
        Some(active) => post.is_active = active,
        None if replace => post.is_active = true,
        None => {}
    }

    match input.category.as_deref().map(str::trim) {
        Some("") => post.category_id = None,
        Some(slug) => {
            let category = state
                .repo
                .find_category_by_slug(slug)
                .await?
                .ok_or_else(|| AppError::BadRequest(format!("Unknown category {}", slug)))?;
            post.category_id = Some(category.id);
        }
        None if replace => post.category_id = None,
        None => {}
    }

    match input.tags {
        Some(slugs) => {
            let mut ids = Vec::with_capacity(slugs.len());
            for slug in slugs {
                let tag = state
                    .repo
                    .find_tag_by_slug(slug.trim())
                    .await?
                    .ok_or_else(|| AppError::BadRequest(format!("Unknown tag {}", slug)))?;
                ids.push(tag.id);
            }
            post.tag_ids = ids;
        }
        None if replace => post.tag_ids.clear(),
        None => {}
    }

    Ok(())
}
