use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use super::{RepositoryError, SqliteRepository};
use crate::db::models::Tag;

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        created_at: row.get(3)?,
    })
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn save_tag(&self, tag: &Tag) -> Result<(), RepositoryError>;

    async fn find_tag(&self, id: &str) -> Result<Option<Tag>, RepositoryError>;

    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepositoryError>;

    async fn list_tags(&self) -> Result<Vec<Tag>, RepositoryError>;

    async fn delete_tag(&self, id: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
impl TagRepository for SqliteRepository {
    async fn save_tag(&self, tag: &Tag) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO tags (id, name, slug, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
               name = excluded.name,
               slug = excluded.slug",
            params![tag.id, tag.name, tag.slug, tag.created_at],
        )?;

        Ok(())
    }

    async fn find_tag(&self, id: &str) -> Result<Option<Tag>, RepositoryError> {
        let conn = self.pool.get()?;
        let tag = conn
            .query_row(
                "SELECT id, name, slug, created_at FROM tags WHERE id = ?1",
                params![id],
                tag_from_row,
            )
            .optional()?;
        Ok(tag)
    }

    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepositoryError> {
        let conn = self.pool.get()?;
        let tag = conn
            .query_row(
                "SELECT id, name, slug, created_at FROM tags WHERE slug = ?1",
                params![slug],
                tag_from_row,
            )
            .optional()?;
        Ok(tag)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, name, slug, created_at FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], tag_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    async fn delete_tag(&self, id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{create_test_repo, tag};

    #[tokio::test]
    async fn test_save_find_and_list() {
        let (repo, _temp) = create_test_repo();
        repo.save_tag(&tag("t2", "Web", "web")).await.unwrap();
        repo.save_tag(&tag("t1", "Async", "async")).await.unwrap();

        assert_eq!(
            repo.find_tag_by_slug("web").await.unwrap().map(|t| t.id),
            Some("t2".to_string())
        );
        let names: Vec<String> = repo
            .list_tags()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Async", "Web"]);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_constraint_error() {
        let (repo, _temp) = create_test_repo();
        repo.save_tag(&tag("t1", "Web", "web")).await.unwrap();
        let err = repo.save_tag(&tag("t2", "WEB", "web")).await.unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, _temp) = create_test_repo();
        repo.save_tag(&tag("t1", "Web", "web")).await.unwrap();
        assert!(repo.delete_tag("t1").await.unwrap());
        assert_eq!(repo.find_tag("t1").await.unwrap(), None);
    }
}
