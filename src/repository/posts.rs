use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};

use super::{RepositoryError, SqliteRepository};
use crate::content::domain::{PostFilter, PostOrder};
use crate::db::models::{Post, PostView, SlugRef};

const POST_COLUMNS: &str = "p.id, p.title, p.slug, p.content, p.excerpt, p.author_id, p.category_id,
     p.status, p.is_active, p.published_date, p.view_count, p.likes, p.created_at, p.updated_at";

/// Map the first 14 columns (POST_COLUMNS). Tags are loaded separately.
fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        content: row.get(3)?,
        excerpt: row.get(4)?,
        author_id: row.get(5)?,
        category_id: row.get(6)?,
        tag_ids: Vec::new(),
        status: row.get(7)?,
        is_active: row.get(8)?,
        published_date: row.get(9)?,
        view_count: row.get(10)?,
        likes: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn view_from_row(row: &Row<'_>) -> rusqlite::Result<PostView> {
    let post = post_from_row(row)?;
    let category_slug: Option<String> = row.get(15)?;
    let category_name: Option<String> = row.get(16)?;
    let category = match (category_slug, category_name) {
        (Some(slug), Some(name)) => Some(SlugRef { slug, name }),
        _ => None,
    };
    Ok(PostView {
        post,
        author_username: row.get(14)?,
        category,
        tags: Vec::new(),
        comment_count: row.get(17)?,
    })
}

fn load_tags(conn: &Connection, post_id: &str) -> rusqlite::Result<Vec<(String, SlugRef)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.id, t.slug, t.name FROM tags t
         JOIN post_tags pt ON pt.tag_id = t.id
         WHERE pt.post_id = ?1
         ORDER BY t.name",
    )?;
    let tags = stmt
        .query_map(params![post_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                SlugRef {
                    slug: row.get(1)?,
                    name: row.get(2)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

fn attach_tags(conn: &Connection, view: &mut PostView) -> rusqlite::Result<()> {
    let tags = load_tags(conn, &view.post.id)?;
    view.post.tag_ids = tags.iter().map(|(id, _)| id.clone()).collect();
    view.tags = tags.into_iter().map(|(_, tag)| tag).collect();
    Ok(())
}

fn find_post_where(
    conn: &Connection,
    column: &str,
    value: &str,
) -> Result<Option<Post>, RepositoryError> {
    let post = conn
        .query_row(
            &format!("SELECT {} FROM posts p WHERE p.{} = ?1", POST_COLUMNS, column),
            params![value],
            post_from_row,
        )
        .optional()?;

    match post {
        Some(mut post) => {
            post.tag_ids = load_tags(conn, &post.id)?
                .into_iter()
                .map(|(id, _)| id)
                .collect();
            Ok(Some(post))
        }
        None => Ok(None),
    }
}

fn view_select() -> String {
    format!(
        "SELECT {},
                u.username, c.slug, c.name,
                (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id AND cm.is_approved = 1)
         FROM posts p
         JOIN users u ON u.id = p.author_id
         LEFT JOIN categories c ON c.id = p.category_id",
        POST_COLUMNS
    )
}

/// Build the listing query for a filter. Predicates are ANDed onto the active set.
fn list_query(filter: &PostFilter) -> (String, Vec<String>) {
    let mut sql = format!("{} WHERE p.is_active = 1", view_select());
    let mut args: Vec<String> = Vec::new();

    if let Some(ref slug) = filter.category_slug {
        args.push(slug.clone());
        sql.push_str(&format!(" AND c.slug = ?{}", args.len()));
    }
    if let Some(ref author) = filter.author_id {
        args.push(author.clone());
        sql.push_str(&format!(" AND p.author_id = ?{}", args.len()));
    }
    if let Some(ref tag) = filter.tag_slug {
        args.push(tag.clone());
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id
                          WHERE pt.post_id = p.id AND t.slug = ?{})",
            args.len()
        ));
    }
    if let Some(status) = filter.status {
        args.push(status.as_str().to_string());
        sql.push_str(&format!(" AND p.status = ?{}", args.len()));
    }
    if filter.published_only {
        sql.push_str(" AND p.published_date IS NOT NULL");
    }

    sql.push_str(match filter.order {
        PostOrder::NewestCreated => " ORDER BY p.created_at DESC, p.id DESC",
        PostOrder::NewestPublished => " ORDER BY p.published_date DESC, p.id DESC",
    });
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    (sql, args)
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Upsert the post and replace its tag links atomically.
    async fn save_post(&self, post: &Post) -> Result<(), RepositoryError>;

    async fn find_post(&self, id: &str) -> Result<Option<Post>, RepositoryError>;

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, RepositoryError>;

    /// Post with author, category, tags and approved comment count resolved.
    async fn find_post_view(&self, slug: &str) -> Result<Option<PostView>, RepositoryError>;

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostView>, RepositoryError>;

    async fn delete_post(&self, id: &str) -> Result<bool, RepositoryError>;

    async fn record_view(&self, id: &str) -> Result<(), RepositoryError>;

    /// Increment the like counter, returning the new total.
    async fn add_like(&self, id: &str) -> Result<i64, RepositoryError>;
}

#[async_trait]
impl PostRepository for SqliteRepository {
    async fn save_post(&self, post: &Post) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO posts (id, title, slug, content, excerpt, author_id, category_id, status,
                                is_active, published_date, view_count, likes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(id) DO UPDATE SET
               title = excluded.title,
               slug = excluded.slug,
               content = excluded.content,
               excerpt = excluded.excerpt,
               category_id = excluded.category_id,
               status = excluded.status,
               is_active = excluded.is_active,
               published_date = COALESCE(posts.published_date, excluded.published_date),
               updated_at = excluded.updated_at",
            params![
                post.id,
                post.title,
                post.slug,
                post.content,
                post.excerpt,
                post.author_id,
                post.category_id,
                post.status,
                post.is_active,
                post.published_date,
                post.view_count,
                post.likes,
                post.created_at,
                post.updated_at
            ],
        )?;

        tx.execute("DELETE FROM post_tags WHERE post_id = ?1", params![post.id])?;
        for tag_id in &post.tag_ids {
            tx.execute(
                "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
                params![post.id, tag_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    async fn find_post(&self, id: &str) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        find_post_where(&conn, "id", id)
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        find_post_where(&conn, "slug", slug)
    }

    async fn find_post_view(&self, slug: &str) -> Result<Option<PostView>, RepositoryError> {
        let conn = self.pool.get()?;
        // Detail lookups ignore is_active
        let sql = format!("{} WHERE p.slug = ?1", view_select());

        let view = conn.query_row(&sql, params![slug], view_from_row).optional()?;
        match view {
            Some(mut view) => {
                attach_tags(&conn, &mut view)?;
                Ok(Some(view))
            }
            None => Ok(None),
        }
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostView>, RepositoryError> {
        let conn = self.pool.get()?;
        let (sql, args) = list_query(filter);

        let mut stmt = conn.prepare(&sql)?;
        let mut views = stmt
            .query_map(params_from_iter(args.iter()), view_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for view in &mut views {
            attach_tags(&conn, view)?;
        }
        Ok(views)
    }

    async fn delete_post(&self, id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    async fn record_view(&self, id: &str) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    async fn add_like(&self, id: &str) -> Result<i64, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("UPDATE posts SET likes = likes + 1 WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(format!("post {}", id)));
        }
        let likes = conn.query_row("SELECT likes FROM posts WHERE id = ?1", params![id], |row| {
            row.get(0)
        })?;
        Ok(likes)
    }
}
