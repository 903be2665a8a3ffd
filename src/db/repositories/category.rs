//! Category repository
//!
//! Database operations for categories. The localized name is stored as
//! one column per locale and reassembled into `Localized<String>` when
//! rows are read.

use crate::models::{Category, Localized};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: &Category) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// List all categories
    async fn list(&self) -> Result<Vec<Category>>;

    /// Update a category (full row write)
    async fn update(&self, category: &Category) -> Result<Category>;

    /// Delete a category
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a category slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Count posts attached to this category
    async fn post_count(&self, id: i64) -> Result<i64>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: SqlitePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an Arc'd repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        create_category(&self.pool, category).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        get_category_by_id(&self.pool, id).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let row = sqlx::query(
            r#"
            SELECT id, name_en, name_vi, name_fr, slug, created_at, updated_at
            FROM categories
            WHERE slug = ?
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get category by slug")?;

        Ok(row.map(|row| row_to_category(&row)))
    }

    async fn list(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name_en, name_vi, name_fr, slug, created_at, updated_at
            FROM categories
            ORDER BY name_en
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list categories")?;

        Ok(rows.iter().map(row_to_category).collect())
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        sqlx::query(
            r#"
            UPDATE categories
            SET name_en = ?, name_vi = ?, name_fr = ?, slug = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&category.name.en)
        .bind(&category.name.vi)
        .bind(&category.name.fr)
        .bind(&category.slug)
        .bind(Utc::now())
        .bind(category.id)
        .execute(&self.pool)
        .await
        .context("Failed to update category")?;

        get_category_by_id(&self.pool, category.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Category not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete category")?;

        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check category slug existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn post_count(&self, id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM post_categories WHERE category_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts for category")?;

        Ok(row.get("count"))
    }
}

async fn create_category(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO categories (name_en, name_vi, name_fr, slug, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&category.name.en)
    .bind(&category.name.vi)
    .bind(&category.name.fr)
    .bind(&category.slug)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    let id = result.last_insert_rowid();

    Ok(Category {
        id,
        name: category.name.clone(),
        slug: category.slug.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_category_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    let row = sqlx::query(
        r#"
        SELECT id, name_en, name_vi, name_fr, slug, created_at, updated_at
        FROM categories
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get category by ID")?;

    Ok(row.map(|row| row_to_category(&row)))
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        name: Localized::new(
            row.get::<String, _>("name_en"),
            row.get::<String, _>("name_vi"),
            row.get::<String, _>("name_fr"),
        ),
        slug: row.get("slug"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
