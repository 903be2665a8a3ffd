//! Post repository
//!
//! Database operations for posts. Category assignments live in the
//! `post_categories` join table and are written in the same transaction
//! as the post row. List queries take a `PostFilter`; the owner filter
//! is how scoped read access reaches the query level.

use crate::models::{ListParams, Localized, PagedResult, Post, PublishState};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Filters applied to post list queries
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
    /// Restrict to posts authored by this user
    pub owner: Option<i64>,
    /// Restrict to a publication state
    pub state: Option<PublishState>,
    /// Restrict to posts attached to this category
    pub category_id: Option<i64>,
}

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post with its category assignments
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Get post by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// List posts matching the filter, newest first
    async fn list(&self, filter: &PostFilter, params: &ListParams) -> Result<PagedResult<Post>>;

    /// Update a post (full row write, category assignments replaced)
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a post slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: SqlitePool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an Arc'd repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

const POST_COLUMNS: &str = "p.id, p.title_en, p.title_vi, p.title_fr, p.slug, p.state, \
     p.author_id, p.excerpt_en, p.excerpt_vi, p.excerpt_fr, \
     p.content_en, p.content_vi, p.content_fr, p.thumbnail, p.created_at, p.updated_at";

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        create_post(&self.pool, post).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        get_post_by_id(&self.pool, id).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts p WHERE p.slug = ?", POST_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post by slug")?;

        match row {
            Some(row) => {
                let mut post = row_to_post(&row)?;
                post.category_ids = get_category_ids(&self.pool, post.id).await?;
                Ok(Some(post))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &PostFilter, params: &ListParams) -> Result<PagedResult<Post>> {
        list_posts(&self.pool, filter, params).await
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        update_post(&self.pool, post).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        // Join rows go with the post via ON DELETE CASCADE
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE slug = ?")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check post slug existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

async fn create_post(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO posts (title_en, title_vi, title_fr, slug, state, author_id,
                           excerpt_en, excerpt_vi, excerpt_fr,
                           content_en, content_vi, content_fr,
                           thumbnail, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.title.en)
    .bind(&post.title.vi)
    .bind(&post.title.fr)
    .bind(&post.slug)
    .bind(post.state.as_str())
    .bind(post.author_id)
    .bind(&post.excerpt.en)
    .bind(&post.excerpt.vi)
    .bind(&post.excerpt.fr)
    .bind(&post.content.en)
    .bind(&post.content.vi)
    .bind(&post.content.fr)
    .bind(&post.thumbnail)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create post")?;

    let id = result.last_insert_rowid();

    for category_id in &post.category_ids {
        sqlx::query("INSERT INTO post_categories (post_id, category_id) VALUES (?, ?)")
            .bind(id)
            .bind(category_id)
            .execute(&mut *tx)
            .await
            .context("Failed to attach category to post")?;
    }

    tx.commit().await.context("Failed to commit post")?;

    Ok(Post {
        id,
        title: post.title.clone(),
        slug: post.slug.clone(),
        state: post.state,
        author_id: post.author_id,
        category_ids: post.category_ids.clone(),
        excerpt: post.excerpt.clone(),
        content: post.content.clone(),
        thumbnail: post.thumbnail.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_post_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let sql = format!("SELECT {} FROM posts p WHERE p.id = ?", POST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    match row {
        Some(row) => {
            let mut post = row_to_post(&row)?;
            post.category_ids = get_category_ids(pool, post.id).await?;
            Ok(Some(post))
        }
        None => Ok(None),
    }
}

async fn list_posts(
    pool: &SqlitePool,
    filter: &PostFilter,
    params: &ListParams,
) -> Result<PagedResult<Post>> {
    let where_clause = filter_where_clause(filter);

    let count_sql = format!("SELECT COUNT(*) as count FROM posts p{}", where_clause);
    let row = bind_filter(sqlx::query(&count_sql), filter)
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;
    let total: i64 = row.get("count");

    let list_sql = format!(
        "SELECT {} FROM posts p{} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
        POST_COLUMNS, where_clause
    );
    let rows = bind_filter(sqlx::query(&list_sql), filter)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row_to_post(&row)?);
    }
    load_category_ids(pool, &mut posts).await?;

    Ok(PagedResult::new(posts, total, params))
}

/// Build the WHERE clause for a filter; binds must be applied in the
/// same order by `bind_filter`.
fn filter_where_clause(filter: &PostFilter) -> String {
    let mut conditions = Vec::new();
    if filter.owner.is_some() {
        conditions.push("p.author_id = ?");
    }
    if filter.state.is_some() {
        conditions.push("p.state = ?");
    }
    if filter.category_id.is_some() {
        conditions.push("p.id IN (SELECT post_id FROM post_categories WHERE category_id = ?)");
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

fn bind_filter<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    filter: &PostFilter,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    let mut query = query;
    if let Some(owner) = filter.owner {
        query = query.bind(owner);
    }
    if let Some(state) = filter.state {
        query = query.bind(state.as_str());
    }
    if let Some(category_id) = filter.category_id {
        query = query.bind(category_id);
    }
    query
}

async fn update_post(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        UPDATE posts
        SET title_en = ?, title_vi = ?, title_fr = ?, slug = ?, state = ?, author_id = ?,
            excerpt_en = ?, excerpt_vi = ?, excerpt_fr = ?,
            content_en = ?, content_vi = ?, content_fr = ?,
            thumbnail = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.title.en)
    .bind(&post.title.vi)
    .bind(&post.title.fr)
    .bind(&post.slug)
    .bind(post.state.as_str())
    .bind(post.author_id)
    .bind(&post.excerpt.en)
    .bind(&post.excerpt.vi)
    .bind(&post.excerpt.fr)
    .bind(&post.content.en)
    .bind(&post.content.vi)
    .bind(&post.content.fr)
    .bind(&post.thumbnail)
    .bind(Utc::now())
    .bind(post.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update post")?;

    // Replace category assignments wholesale
    sqlx::query("DELETE FROM post_categories WHERE post_id = ?")
        .bind(post.id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear post categories")?;

    for category_id in &post.category_ids {
        sqlx::query("INSERT INTO post_categories (post_id, category_id) VALUES (?, ?)")
            .bind(post.id)
            .bind(category_id)
            .execute(&mut *tx)
            .await
            .context("Failed to attach category to post")?;
    }

    tx.commit().await.context("Failed to commit post update")?;

    get_post_by_id(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn get_category_ids(pool: &SqlitePool, post_id: i64) -> Result<Vec<i64>> {
    let rows = sqlx::query(
        "SELECT category_id FROM post_categories WHERE post_id = ? ORDER BY category_id",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .context("Failed to load post categories")?;

    Ok(rows.iter().map(|row| row.get("category_id")).collect())
}

/// Batch-load category IDs for a page of posts.
async fn load_category_ids(pool: &SqlitePool, posts: &mut [Post]) -> Result<()> {
    if posts.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; posts.len()].join(", ");
    let sql = format!(
        "SELECT post_id, category_id FROM post_categories WHERE post_id IN ({}) ORDER BY category_id",
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for post in posts.iter() {
        query = query.bind(post.id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load post categories")?;

    let mut by_post: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in rows {
        by_post
            .entry(row.get("post_id"))
            .or_default()
            .push(row.get("category_id"));
    }

    for post in posts.iter_mut() {
        post.category_ids = by_post.remove(&post.id).unwrap_or_default();
    }

    Ok(())
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let state_str: String = row.get("state");
    let state = PublishState::from_str(&state_str)?;

    Ok(Post {
        id: row.get("id"),
        title: Localized::new(
            row.get::<String, _>("title_en"),
            row.get::<String, _>("title_vi"),
            row.get::<String, _>("title_fr"),
        ),
        slug: row.get("slug"),
        state,
        author_id: row.get("author_id"),
        category_ids: Vec::new(),
        excerpt: Localized::new(
            row.get::<String, _>("excerpt_en"),
            row.get::<String, _>("excerpt_vi"),
            row.get::<String, _>("excerpt_fr"),
        ),
        content: Localized::new(
            row.get::<Option<String>, _>("content_en"),
            row.get::<Option<String>, _>("content_vi"),
            row.get::<Option<String>, _>("content_fr"),
        ),
        thumbnail: row.get("thumbnail"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
