use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::content::PostFilter;
use crate::db::models::PostView;
use crate::error::AppResult;
use crate::repository::{PostRepository, SettingsRepository};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub site_name: String,
    pub maintenance_mode: bool,
    pub featured: Vec<FeaturedPost>,
}

pub struct FeaturedPost {
    pub title: String,
    pub slug: String,
    pub author: String,
    pub excerpt: String,
    pub published: String,
}

impl From<PostView> for FeaturedPost {
    fn from(view: PostView) -> Self {
        Self {
            published: view
                .post
                .published_date
                .map(|d| d.format("%B %-d, %Y").to_string())
                .unwrap_or_default(),
            title: view.post.title,
            slug: view.post.slug,
            author: view.author_username,
            excerpt: view.post.excerpt,
        }
    }
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

pub async fn index(State(state): State<AppState>) -> AppResult<Html<HomeTemplate>> {
    let settings = state.repo.load_settings().await?;
    let featured = state
        .repo
        .list_posts(&PostFilter::featured())
        .await?
        .into_iter()
        .map(FeaturedPost::from)
        .collect();

    Ok(Html(HomeTemplate {
        site_name: settings.site_name,
        maintenance_mode: settings.maintenance_mode,
        featured,
    }))
}
