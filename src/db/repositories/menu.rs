//! Menu repository

use crate::models::{Localized, Menu};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Menu repository trait
#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Create a new menu
    async fn create(&self, menu: &Menu) -> Result<Menu>;

    /// Get menu by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Menu>>;

    /// List all menus
    async fn list(&self) -> Result<Vec<Menu>>;

    /// Update a menu (full row write)
    async fn update(&self, menu: &Menu) -> Result<Menu>;

    /// Delete a menu
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based menu repository implementation
pub struct SqlxMenuRepository {
    pool: SqlitePool,
}

impl SqlxMenuRepository {
    /// Create a new SQLx menu repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an Arc'd repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn MenuRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MenuRepository for SqlxMenuRepository {
    async fn create(&self, menu: &Menu) -> Result<Menu> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO menus (body_en, body_vi, body_fr, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&menu.body.en)
        .bind(&menu.body.vi)
        .bind(&menu.body.fr)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create menu")?;

        Ok(Menu {
            id: result.last_insert_rowid(),
            body: menu.body.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Menu>> {
        get_menu_by_id(&self.pool, id).await
    }

    async fn list(&self) -> Result<Vec<Menu>> {
        let rows = sqlx::query(
            "SELECT id, body_en, body_vi, body_fr, created_at, updated_at FROM menus ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list menus")?;

        Ok(rows.iter().map(row_to_menu).collect())
    }

    async fn update(&self, menu: &Menu) -> Result<Menu> {
        sqlx::query(
            r#"
            UPDATE menus
            SET body_en = ?, body_vi = ?, body_fr = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&menu.body.en)
        .bind(&menu.body.vi)
        .bind(&menu.body.fr)
        .bind(Utc::now())
        .bind(menu.id)
        .execute(&self.pool)
        .await
        .context("Failed to update menu")?;

        get_menu_by_id(&self.pool, menu.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Menu not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM menus WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete menu")?;

        Ok(())
    }
}

async fn get_menu_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Menu>> {
    let row = sqlx::query(
        "SELECT id, body_en, body_vi, body_fr, created_at, updated_at FROM menus WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get menu by ID")?;

    Ok(row.map(|row| row_to_menu(&row)))
}

fn row_to_menu(row: &sqlx::sqlite::SqliteRow) -> Menu {
    Menu {
        id: row.get("id"),
        body: Localized::new(
            row.get::<String, _>("body_en"),
            row.get::<String, _>("body_vi"),
            row.get::<String, _>("body_fr"),
        ),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_repo() -> SqlxMenuRepository {
        let pool = crate::db::create_test_pool()
            .await
            .expect("Failed to create test pool");
        crate::db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxMenuRepository::new(pool)
    }

    fn test_menu() -> Menu {
        Menu::new(Localized::new(
            "Home | About".to_string(),
            "Trang chủ | Giới thiệu".to_string(),
            "Accueil | À propos".to_string(),
        ))
    }

    #[tokio::test]
    async fn test_create_and_get_menu() {
        let repo = setup_test_repo().await;

        let created = repo.create(&test_menu()).await.expect("Failed to create menu");
        assert!(created.id > 0);

        let found = repo.get_by_id(created.id).await.unwrap().expect("Menu not found");
        assert_eq!(found.body.vi, "Trang chủ | Giới thiệu");

        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_menus() {
        let repo = setup_test_repo().await;
        repo.create(&test_menu()).await.unwrap();
        repo.create(&test_menu()).await.unwrap();

        let menus = repo.list().await.expect("Failed to list menus");
        assert_eq!(menus.len(), 2);
    }

    #[tokio::test]
    async fn test_update_menu() {
        let repo = setup_test_repo().await;
        let mut menu = repo.create(&test_menu()).await.unwrap();

        menu.body.fr = "Accueil | Contact".to_string();
        let updated = repo.update(&menu).await.expect("Failed to update menu");

        assert_eq!(updated.body.fr, "Accueil | Contact");
        assert_eq!(updated.body.en, "Home | About");
    }

    #[tokio::test]
    async fn test_delete_menu() {
        let repo = setup_test_repo().await;
        let created = repo.create(&test_menu()).await.unwrap();

        repo.delete(created.id).await.expect("Failed to delete menu");
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
