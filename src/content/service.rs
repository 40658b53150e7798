// Write path for content: lifecycle rules first, then the repository
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::domain::{
    prepare_category, prepare_post, prepare_tag, validate_contact_message, validate_settings,
    validate_user, ContentError,
};
use crate::db::models::{Category, Comment, ContactMessage, Post, SiteSettings, Tag, User};
use crate::repository::{
    CategoryRepository, CommentRepository, ContactRepository, DynRepository, PostRepository,
    RepositoryError, SettingsRepository, TagRepository, UserRepository,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Clone)]
pub struct ContentService {
    repo: DynRepository,
}

impl ContentService {
    pub fn new(repo: DynRepository) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &DynRepository {
        &self.repo
    }

    pub async fn save_user(&self, mut user: User, now: DateTime<Utc>) -> ServiceResult<User> {
        user.username = user.username.trim().to_string();
        user.email = user.email.trim().to_string();
        validate_user(&user)?;
        user.updated_at = now;
        self.repo.save_user(&user).await?;
        tracing::info!("Saved user {}", user.username);
        Ok(user)
    }

    /// Apply slug derivation and the publish latch, check references, persist.
    pub async fn save_post(&self, mut post: Post, now: DateTime<Utc>) -> ServiceResult<Post> {
        prepare_post(&mut post, now)?;

        if let Some(ref category_id) = post.category_id {
            if self.repo.find_category(category_id).await?.is_none() {
                return Err(ContentError::Invalid(format!("Unknown category {}", category_id)).into());
            }
        }
        for tag_id in &post.tag_ids {
            if self.repo.find_tag(tag_id).await?.is_none() {
                return Err(ContentError::Invalid(format!("Unknown tag {}", tag_id)).into());
            }
        }

        self.repo.save_post(&post).await?;
        tracing::info!(
            "Saved post {} ({}, status {})",
            post.slug,
            post.id,
            post.status
        );
        Ok(post)
    }

    pub async fn save_category(&self, mut category: Category) -> ServiceResult<Category> {
        prepare_category(&mut category)?;
        self.repo.save_category(&category).await?;
        tracing::info!("Saved category {}", category.slug);
        Ok(category)
    }

    pub async fn save_tag(&self, mut tag: Tag) -> ServiceResult<Tag> {
        prepare_tag(&mut tag)?;
        self.repo.save_tag(&tag).await?;
        tracing::info!("Saved tag {}", tag.slug);
        Ok(tag)
    }

    /// Replies must point at a comment on the same post.
    pub async fn save_comment(&self, mut comment: Comment, now: DateTime<Utc>) -> ServiceResult<Comment> {
        if comment.content.trim().is_empty() {
            return Err(ContentError::Required { field: "content" }.into());
        }
        if self.repo.find_post(&comment.post_id).await?.is_none() {
            return Err(ContentError::Invalid(format!("Unknown post {}", comment.post_id)).into());
        }
        if let Some(ref parent_id) = comment.parent_id {
            match self.repo.find_comment(parent_id).await? {
                Some(parent) if parent.post_id == comment.post_id => {}
                Some(_) => {
                    return Err(ContentError::Invalid(
                        "Parent comment belongs to a different post".to_string(),
                    )
                    .into())
                }
                None => {
                    return Err(
                        ContentError::Invalid(format!("Unknown parent comment {}", parent_id)).into(),
                    )
                }
            }
        }

        comment.updated_at = now;
        self.repo.save_comment(&comment).await?;
        Ok(comment)
    }

    pub async fn save_contact_message(&self, message: ContactMessage) -> ServiceResult<ContactMessage> {
        validate_contact_message(&message)?;
        self.repo.save_contact_message(&message).await?;
        tracing::info!("Contact message {} from {}", message.id, message.email);
        Ok(message)
    }

    pub async fn save_settings(
        &self,
        mut settings: SiteSettings,
        now: DateTime<Utc>,
    ) -> ServiceResult<SiteSettings> {
        validate_settings(&settings)?;
        settings.updated_at = Some(now);
        self.repo.save_settings(&settings).await?;
        tracing::info!(
            "Site settings updated (maintenance mode {})",
            settings.maintenance_mode
        );
        Ok(settings)
    }

    /// Is the site in maintenance mode right now?
    pub async fn maintenance_mode(&self) -> ServiceResult<bool> {
        Ok(self.repo.load_settings().await?.maintenance_mode)
    }
}

impl ServiceError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, ServiceError::Repository(e) if e.is_constraint_violation())
    }
}
