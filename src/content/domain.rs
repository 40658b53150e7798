// Content lifecycle rules - pure functions, no storage access
use chrono::{DateTime, Utc};
use regex::Regex;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::db::models::{Category, ContactMessage, Post, SiteSettings, Tag, User};

/// Number of posts returned by the featured view.
pub const FEATURED_LIMIT: usize = 5;

static VALID_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("Could not create slug regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "archived" => Ok(PostStatus::Archived),
            other => Err(ContentError::InvalidStatus(other.to_string())),
        }
    }
}

impl ToSql for PostStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PostStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: ContentError| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("Could not derive a slug from {0:?}")]
    EmptySlug(String),

    #[error("Invalid slug {0:?}: use letters, numbers, hyphens or underscores")]
    InvalidSlug(String),

    #[error("Unknown post status {0:?}")]
    InvalidStatus(String),

    #[error("{field} cannot be empty")]
    Required { field: &'static str },

    #[error("{0}")]
    Invalid(String),
}

/// Transliterate to ASCII, lowercase, collapse every run of non-alphanumerics
/// into one hyphen, trim hyphens.
pub fn slugify(text: &str) -> String {
    slug::slugify(text)
}

/// Entities whose slug is derived from a display name on first save.
pub trait Sluggable {
    fn display_name(&self) -> &str;
    fn slug(&self) -> &str;
    fn set_slug(&mut self, slug: String);
}

impl Sluggable for Category {
    fn display_name(&self) -> &str {
        &self.name
    }
    fn slug(&self) -> &str {
        &self.slug
    }
    fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }
}

impl Sluggable for Tag {
    fn display_name(&self) -> &str {
        &self.name
    }
    fn slug(&self) -> &str {
        &self.slug
    }
    fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }
}

impl Sluggable for Post {
    fn display_name(&self) -> &str {
        &self.title
    }
    fn slug(&self) -> &str {
        &self.slug
    }
    fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }
}

/// Derive the slug from the display name when it is empty; otherwise keep it.
///
/// A slug that is already set is never recomputed, even if the name changed
/// since it was derived. Explicit slugs are only checked for shape.
pub fn ensure_slug<T: Sluggable>(entity: &mut T) -> Result<(), ContentError> {
    let current = entity.slug().trim();
    if !current.is_empty() {
        if !VALID_SLUG.is_match(current) {
            return Err(ContentError::InvalidSlug(current.to_string()));
        }
        let trimmed = current.to_string();
        entity.set_slug(trimmed);
        return Ok(());
    }

    let derived = slugify(entity.display_name());
    if derived.is_empty() {
        return Err(ContentError::EmptySlug(entity.display_name().to_string()));
    }
    entity.set_slug(derived);
    Ok(())
}

/// Stamp `published_date` the first time a post is saved as published.
/// Never clears or moves an existing timestamp.
pub fn latch_published_date(post: &mut Post, now: DateTime<Utc>) {
    if post.status == PostStatus::Published && post.published_date.is_none() {
        post.published_date = Some(now);
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ContentError> {
    if value.trim().is_empty() {
        Err(ContentError::Required { field })
    } else {
        Ok(())
    }
}

/// All pre-persist rules for a post, in order.
pub fn prepare_post(post: &mut Post, now: DateTime<Utc>) -> Result<(), ContentError> {
    require("title", &post.title)?;
    ensure_slug(post)?;
    latch_published_date(post, now);
    post.updated_at = now;
    Ok(())
}

pub fn prepare_category(category: &mut Category) -> Result<(), ContentError> {
    require("name", &category.name)?;
    ensure_slug(category)
}

pub fn prepare_tag(tag: &mut Tag) -> Result<(), ContentError> {
    require("name", &tag.name)?;
    ensure_slug(tag)
}

pub fn validate_user(user: &User) -> Result<(), ContentError> {
    require("username", &user.username)?;
    require("email", &user.email)?;
    if !user.email.contains('@') {
        return Err(ContentError::Invalid(format!(
            "{} is not an email address",
            user.email
        )));
    }
    Ok(())
}

pub fn validate_contact_message(message: &ContactMessage) -> Result<(), ContentError> {
    require("name", &message.name)?;
    require("email", &message.email)?;
    require("subject", &message.subject)?;
    require("message", &message.message)
}

pub fn validate_settings(settings: &SiteSettings) -> Result<(), ContentError> {
    require("site_name", &settings.site_name)?;
    if settings.posts_per_page < 1 {
        return Err(ContentError::Invalid(
            "posts_per_page must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Ordering applied to a post listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    #[default]
    NewestCreated,
    NewestPublished,
}

/// Conjunctive filter over the active post set. `None` means "not filtered".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub category_slug: Option<String>,
    pub author_id: Option<String>,
    pub tag_slug: Option<String>,
    pub status: Option<PostStatus>,
    pub published_only: bool,
    pub order: PostOrder,
    pub limit: Option<usize>,
}

impl PostFilter {
    /// Build a filter from raw query values. Empty or unparseable values are dropped.
    pub fn from_params(
        category: Option<&str>,
        author: Option<&str>,
        tag: Option<&str>,
        status: Option<&str>,
    ) -> Self {
        fn non_empty(value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            category_slug: non_empty(category),
            author_id: non_empty(author),
            tag_slug: non_empty(tag),
            status: status.and_then(|s| s.trim().parse().ok()),
            ..Self::default()
        }
    }

    /// Published posts, newest publication first, capped at [`FEATURED_LIMIT`].
    pub fn featured() -> Self {
        Self {
            published_only: true,
            order: PostOrder::NewestPublished,
            limit: Some(FEATURED_LIMIT),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post(title: &str, status: PostStatus) -> Post {
        let now = Utc::now();
        Post {
            id: "p1".to_string(),
            title: title.to_string(),
            slug: String::new(),
            content: "body".to_string(),
            excerpt: String::new(),
            author_id: "u1".to_string(),
            category_id: None,
            tag_ids: Vec::new(),
            status,
            is_active: true,
            published_date: None,
            view_count: 0,
            likes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Hello   World"), "hello-world");
        assert_eq!(slugify("Rust 2024: What's New?"), "rust-2024-what-s-new");
        assert_eq!(slugify("--Already-Sluggy--"), "already-sluggy");
        assert_eq!(slugify("snake_case_title"), "snake-case-title");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_transliterates_accented_titles() {
        assert_eq!(slugify("Café Crème"), "cafe-creme");
        assert_eq!(slugify("Straße"), "strasse");
        assert_eq!(slugify("Über uns"), "uber-uns");
        assert_eq!(slugify("  Señor Niño! "), "senor-nino");
    }

    #[test]
    fn accented_title_derives_ascii_slug() {
        let mut p = post("Crème Brûlée", PostStatus::Draft);
        ensure_slug(&mut p).unwrap();
        assert_eq!(p.slug, "creme-brulee");
    }

    #[test]
    fn ensure_slug_derives_from_title_when_empty() {
        let mut p = post("My First Post", PostStatus::Draft);
        ensure_slug(&mut p).unwrap();
        assert_eq!(p.slug, "my-first-post");
    }

    #[test]
    fn ensure_slug_never_recomputes_existing_slug() {
        let mut p = post("My First Post", PostStatus::Draft);
        ensure_slug(&mut p).unwrap();
        p.title = "A Completely Different Title".to_string();
        ensure_slug(&mut p).unwrap();
        assert_eq!(p.slug, "my-first-post");
    }

    #[test]
    fn ensure_slug_keeps_explicit_slug() {
        let mut p = post("Ignored", PostStatus::Draft);
        p.slug = "Custom_Slug-1".to_string();
        ensure_slug(&mut p).unwrap();
        assert_eq!(p.slug, "Custom_Slug-1");
    }

    #[test]
    fn ensure_slug_rejects_malformed_explicit_slug() {
        let mut p = post("Ignored", PostStatus::Draft);
        p.slug = "has spaces".to_string();
        assert_eq!(
            ensure_slug(&mut p),
            Err(ContentError::InvalidSlug("has spaces".to_string()))
        );
    }

    #[test]
    fn ensure_slug_rejects_title_without_alphanumerics() {
        let mut p = post("???", PostStatus::Draft);
        assert!(matches!(
            ensure_slug(&mut p),
            Err(ContentError::EmptySlug(_))
        ));
    }

    #[test]
    fn latch_stamps_on_first_publish() {
        let now = Utc::now();
        let mut p = post("Title", PostStatus::Published);
        latch_published_date(&mut p, now);
        assert_eq!(p.published_date, Some(now));
    }

    #[test]
    fn latch_ignores_drafts() {
        let mut p = post("Title", PostStatus::Draft);
        latch_published_date(&mut p, Utc::now());
        assert_eq!(p.published_date, None);
    }

    #[test]
    fn latch_survives_unpublish_and_republish() {
        let first = Utc::now();
        let mut p = post("Title", PostStatus::Published);
        latch_published_date(&mut p, first);

        p.status = PostStatus::Draft;
        latch_published_date(&mut p, first + Duration::hours(1));
        assert_eq!(p.published_date, Some(first));

        p.status = PostStatus::Published;
        latch_published_date(&mut p, first + Duration::hours(2));
        assert_eq!(p.published_date, Some(first));
    }

    #[test]
    fn prepare_post_requires_title() {
        let mut p = post("   ", PostStatus::Draft);
        assert_eq!(
            prepare_post(&mut p, Utc::now()),
            Err(ContentError::Required { field: "title" })
        );
    }

    #[test]
    fn prepare_post_applies_all_rules() {
        let now = Utc::now();
        let mut p = post("Launch Day", PostStatus::Published);
        prepare_post(&mut p, now).unwrap();
        assert_eq!(p.slug, "launch-day");
        assert_eq!(p.published_date, Some(now));
        assert_eq!(p.updated_at, now);
    }

    #[test]
    fn validate_user_checks_email_shape() {
        let now = Utc::now();
        let mut user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            bio: String::new(),
            is_admin: false,
            date_joined: now,
            updated_at: now,
        };
        assert!(validate_user(&user).is_ok());

        user.email = "alice".to_string();
        assert!(matches!(validate_user(&user), Err(ContentError::Invalid(_))));

        user.username = " ".to_string();
        assert_eq!(
            validate_user(&user),
            Err(ContentError::Required { field: "username" })
        );
    }

    #[test]
    fn validate_settings_rejects_zero_page_size() {
        let settings = SiteSettings {
            posts_per_page: 0,
            ..SiteSettings::default()
        };
        assert!(validate_settings(&settings).is_err());
        assert!(validate_settings(&SiteSettings::default()).is_ok());
    }

    #[test]
    fn post_status_round_trips_through_str() {
        for status in [
            PostStatus::Draft,
            PostStatus::Published,
            PostStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<PostStatus>().unwrap(), status);
        }
        assert!("deleted".parse::<PostStatus>().is_err());
    }

    #[test]
    fn filter_from_params_drops_empty_and_invalid_values() {
        let filter = PostFilter::from_params(Some("rust"), Some(""), None, Some("bogus"));
        assert_eq!(filter.category_slug.as_deref(), Some("rust"));
        assert_eq!(filter.author_id, None);
        assert_eq!(filter.status, None);

        let filter = PostFilter::from_params(None, Some(" u1 "), Some("news"), Some("published"));
        assert_eq!(filter.author_id.as_deref(), Some("u1"));
        assert_eq!(filter.tag_slug.as_deref(), Some("news"));
        assert_eq!(filter.status, Some(PostStatus::Published));
    }

    #[test]
    fn featured_filter_is_capped_and_published_only() {
        let filter = PostFilter::featured();
        assert!(filter.published_only);
        assert_eq!(filter.limit, Some(FEATURED_LIMIT));
        assert_eq!(filter.order, PostOrder::NewestPublished);
    }
}
