//! Page repository

use crate::models::{Localized, Page, PublishState};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Page repository trait
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Create a new page
    async fn create(&self, page: &Page) -> Result<Page>;

    /// Get page by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Page>>;

    /// Get page by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>>;

    /// List pages. `owner` restricts to pages authored by that user,
    /// `state` to a publication state.
    async fn list(&self, owner: Option<i64>, state: Option<PublishState>) -> Result<Vec<Page>>;

    /// Update a page (full row write)
    async fn update(&self, page: &Page) -> Result<Page>;

    /// Delete a page
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a page slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

/// SQLx-based page repository implementation
pub struct SqlxPageRepository {
    pool: SqlitePool,
}

impl SqlxPageRepository {
    /// Create a new SQLx page repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an Arc'd repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn PageRepository> {
        Arc::new(Self::new(pool))
    }
}

const PAGE_COLUMNS: &str = "id, title_en, title_vi, title_fr, slug, state, author_id, \
     content_en, content_vi, content_fr, created_at, updated_at";

#[async_trait]
impl PageRepository for SqlxPageRepository {
    async fn create(&self, page: &Page) -> Result<Page> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO pages (title_en, title_vi, title_fr, slug, state, author_id,
                               content_en, content_vi, content_fr, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&page.title.en)
        .bind(&page.title.vi)
        .bind(&page.title.fr)
        .bind(&page.slug)
        .bind(page.state.as_str())
        .bind(page.author_id)
        .bind(&page.content.en)
        .bind(&page.content.vi)
        .bind(&page.content.fr)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create page")?;

        Ok(Page {
            id: result.last_insert_rowid(),
            title: page.title.clone(),
            slug: page.slug.clone(),
            state: page.state,
            author_id: page.author_id,
            content: page.content.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Page>> {
        get_page_by_id(&self.pool, id).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        let sql = format!("SELECT {} FROM pages WHERE slug = ?", PAGE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get page by slug")?;

        match row {
            Some(row) => Ok(Some(row_to_page(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, owner: Option<i64>, state: Option<PublishState>) -> Result<Vec<Page>> {
        let mut conditions = Vec::new();
        if owner.is_some() {
            conditions.push("author_id = ?");
        }
        if state.is_some() {
            conditions.push("state = ?");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM pages{} ORDER BY title_en",
            PAGE_COLUMNS, where_clause
        );
        let mut query = sqlx::query(&sql);
        if let Some(owner) = owner {
            query = query.bind(owner);
        }
        if let Some(state) = state {
            query = query.bind(state.as_str());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list pages")?;

        let mut pages = Vec::new();
        for row in rows {
            pages.push(row_to_page(&row)?);
        }
        Ok(pages)
    }

    async fn update(&self, page: &Page) -> Result<Page> {
        sqlx::query(
            r#"
            UPDATE pages
            SET title_en = ?, title_vi = ?, title_fr = ?, slug = ?, state = ?, author_id = ?,
                content_en = ?, content_vi = ?, content_fr = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&page.title.en)
        .bind(&page.title.vi)
        .bind(&page.title.fr)
        .bind(&page.slug)
        .bind(page.state.as_str())
        .bind(page.author_id)
        .bind(&page.content.en)
        .bind(&page.content.vi)
        .bind(&page.content.fr)
        .bind(Utc::now())
        .bind(page.id)
        .execute(&self.pool)
        .await
        .context("Failed to update page")?;

        get_page_by_id(&self.pool, page.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Page not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM pages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete page")?;

        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM pages WHERE slug = ?")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check page slug existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

async fn get_page_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Page>> {
    let sql = format!("SELECT {} FROM pages WHERE id = ?", PAGE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get page by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_page(&row)?)),
        None => Ok(None),
    }
}

fn row_to_page(row: &sqlx::sqlite::SqliteRow) -> Result<Page> {
    let state_str: String = row.get("state");
    let state = PublishState::from_str(&state_str)?;

    Ok(Page {
        id: row.get("id"),
        title: Localized::new(
            row.get::<String, _>("title_en"),
            row.get::<String, _>("title_vi"),
            row.get::<String, _>("title_fr"),
        ),
        slug: row.get("slug"),
        state,
        author_id: row.get("author_id"),
        content: Localized::new(
            row.get::<Option<String>, _>("content_en"),
            row.get::<Option<String>, _>("content_vi"),
            row.get::<Option<String>, _>("content_fr"),
        ),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
