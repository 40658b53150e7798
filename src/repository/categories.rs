use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use super::{RepositoryError, SqliteRepository};
use crate::db::models::Category;

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, color, sort_order, is_active, created_at";

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        color: row.get(4)?,
        order: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn save_category(&self, category: &Category) -> Result<(), RepositoryError>;

    async fn find_category(&self, id: &str) -> Result<Option<Category>, RepositoryError>;

    async fn find_category_by_slug(&self, slug: &str)
        -> Result<Option<Category>, RepositoryError>;

    /// Categories ordered by `order`, then name. Inactive ones only when asked for.
    async fn list_categories(&self, include_inactive: bool)
        -> Result<Vec<Category>, RepositoryError>;

    async fn delete_category(&self, id: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
impl CategoryRepository for SqliteRepository {
    async fn save_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO categories (id, name, slug, description, color, sort_order, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
               name = excluded.name,
               slug = excluded.slug,
               description = excluded.description,
               color = excluded.color,
               sort_order = excluded.sort_order,
               is_active = excluded.is_active",
            params![
                category.id,
                category.name,
                category.slug,
                category.description,
                category.color,
                category.order,
                category.is_active,
                category.created_at
            ],
        )?;

        Ok(())
    }

    async fn find_category(&self, id: &str) -> Result<Option<Category>, RepositoryError> {
        let conn = self.pool.get()?;
        let category = conn
            .query_row(
                &format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS),
                params![id],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    async fn find_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let conn = self.pool.get()?;
        let category = conn
            .query_row(
                &format!(
                    "SELECT {} FROM categories WHERE slug = ?1",
                    CATEGORY_COLUMNS
                ),
                params![slug],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    async fn list_categories(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<Category>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories
             WHERE is_active = 1 OR ?1
             ORDER BY sort_order, name",
            CATEGORY_COLUMNS
        ))?;
        let categories = stmt
            .query_map(params![include_inactive], category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    async fn delete_category(&self, id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{category, create_test_repo};

    #[tokio::test]
    async fn test_save_and_find_by_slug() {
        let (repo, _temp) = create_test_repo();
        let rust = category("c1", "Rust", "rust");
        repo.save_category(&rust).await.unwrap();

        assert_eq!(
            repo.find_category_by_slug("rust").await.unwrap(),
            Some(rust.clone())
        );
        assert_eq!(repo.find_category("c1").await.unwrap(), Some(rust));
        assert_eq!(repo.find_category_by_slug("go").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_constraint_error() {
        let (repo, _temp) = create_test_repo();
        repo.save_category(&category("c1", "Rust", "rust"))
            .await
            .unwrap();

        let err = repo
            .save_category(&category("c2", "Rust again", "rust"))
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_list_orders_and_hides_inactive() {
        let (repo, _temp) = create_test_repo();
        let mut zed = category("c1", "Zed", "zed");
        zed.order = 1;
        let mut alpha = category("c2", "Alpha", "alpha");
        alpha.order = 2;
        let mut beta = category("c3", "Beta", "beta");
        beta.order = 1;
        let mut hidden = category("c4", "Hidden", "hidden");
        hidden.is_active = false;
        for c in [&zed, &alpha, &beta, &hidden] {
            repo.save_category(c).await.unwrap();
        }

        let slugs: Vec<String> = repo
            .list_categories(false)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();
        // hidden has order 0 but is inactive
        assert_eq!(slugs, vec!["beta", "zed", "alpha"]);

        assert_eq!(repo.list_categories(true).await.unwrap().len(), 4);
    }
}
