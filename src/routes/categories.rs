use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::content::PostFilter;
use crate::db::models::{Category, PostView};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::repository::{CategoryRepository, PostRepository};
use crate::routes::posts::PostQuery;
use crate::state::AppState;

const DEFAULT_COLOR: &str = "#6c757d";

#[derive(Deserialize, Default)]
pub struct CategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub order: Option<i64>,
    pub is_active: Option<bool>,
}

impl CategoryInput {
    /// Copy the supplied fields onto `category`. With `replace`, omitted fields reset to defaults.
    fn apply(self, category: &mut Category, replace: bool) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(slug) = self.slug {
            category.slug = slug;
        }
        match self.description {
            Some(description) => category.description = description,
            None if replace => category.description = String::new(),
            None => {}
        }
        match self.color {
            Some(color) => category.color = color,
            None if replace => category.color = DEFAULT_COLOR.to_string(),
            None => {}
        }
        match self.order {
            Some(order) => category.order = order,
            None if replace => category.order = 0,
            None => {}
        }
        match self.is_active {
            Some(active) => category.is_active = active,
            None if replace => category.is_active = true,
            None => {}
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{slug}",
            get(get_category)
                .put(replace_category)
                .patch(update_category)
                .delete(delete_category),
        )
        .route("/categories/{slug}/posts", get(category_posts))
}

async fn list_categories(
    State(state): State<AppState>,
    caller: MaybeUser,
) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.repo.list_categories(caller.is_admin()).await?))
}

async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<CategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    user.require_admin()?;
    if input.name.is_none() {
        return Err(AppError::BadRequest("name is required".into()));
    }

    let mut category = Category {
        id: uuid::Uuid::now_v7().to_string(),
        name: String::new(),
        slug: String::new(),
        description: String::new(),
        color: DEFAULT_COLOR.to_string(),
        order: 0,
        is_active: true,
        created_at: Utc::now(),
    };
    input.apply(&mut category, true);

    let category = state.content.save_category(category).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn find_by_slug(state: &AppState, slug: &str) -> AppResult<Category> {
    state
        .repo
        .find_category_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound)
}

async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Category>> {
    Ok(Json(find_by_slug(&state, &slug).await?))
}

async fn replace_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Json(input): Json<CategoryInput>,
) -> AppResult<Json<Category>> {
    user.require_admin()?;
    if input.name.is_none() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    let mut category = find_by_slug(&state, &slug).await?;
    input.apply(&mut category, true);
    Ok(Json(state.content.save_category(category).await?))
}

async fn update_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Json(input): Json<CategoryInput>,
) -> AppResult<Json<Category>> {
    user.require_admin()?;
    let mut category = find_by_slug(&state, &slug).await?;
    input.apply(&mut category, false);
    Ok(Json(state.content.save_category(category).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    let category = find_by_slug(&state, &slug).await?;
    state.repo.delete_category(&category.id).await?;
    tracing::info!("Category {} deleted", category.slug);
    Ok(StatusCode::NO_CONTENT)
}

async fn category_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PostQuery>,
) -> AppResult<Json<Vec<PostView>>> {
    let category = find_by_slug(&state, &slug).await?;
    let filter = PostFilter {
        category_slug: Some(category.slug),
        ..query.into_filter()
    };
    Ok(Json(state.repo.list_posts(&filter).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category() -> Category {
        Category {
            id: "c1".to_string(),
            name: "Rust".to_string(),
            slug: "rust".to_string(),
            description: "Systems".to_string(),
            color: "#ff0000".to_string(),
            order: 3,
            is_active: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn patch_touches_only_supplied_fields() {
        let mut c = category();
        CategoryInput {
            name: Some("Rustlang".to_string()),
            ..CategoryInput::default()
        }
        .apply(&mut c, false);

        assert_eq!(c.name, "Rustlang");
        assert_eq!(c.slug, "rust");
        assert_eq!(c.description, "Systems");
        assert_eq!(c.order, 3);
        assert!(!c.is_active);
    }

    #[test]
    fn put_resets_omitted_fields() {
        let mut c = category();
        CategoryInput {
            name: Some("Rust".to_string()),
            ..CategoryInput::default()
        }
        .apply(&mut c, true);

        assert_eq!(c.slug, "rust");
        assert_eq!(c.description, "");
        assert_eq!(c.color, DEFAULT_COLOR);
        assert_eq!(c.order, 0);
        assert!(c.is_active);
    }
}
