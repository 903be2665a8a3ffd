//! User repository
//!
//! Database operations for users. `UserRepository` defines the interface,
//! `SqlxUserRepository` implements it against SQLite.

use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// List users. `owner` restricts the result to that user's own row,
    /// which is how scoped read access is applied at the query level.
    async fn list(&self, owner: Option<i64>) -> Result<Vec<User>>;

    /// Update a user (full row write)
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an Arc'd repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        create_user(&self.pool, user).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        get_user_by_id(&self.pool, id).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        get_user_by_email(&self.pool, email).await
    }

    async fn list(&self, owner: Option<i64>) -> Result<Vec<User>> {
        list_users(&self.pool, owner).await
    }

    async fn update(&self, user: &User) -> Result<User> {
        update_user(&self.pool, user).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        delete_user(&self.pool, id).await
    }
}

async fn create_user(pool: &SqlitePool, user: &User) -> Result<User> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash, is_admin)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_admin)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_rowid();

    Ok(User {
        id,
        name: user.name.clone(),
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        is_admin: user.is_admin,
    })
}

async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, name, email, password_hash, is_admin FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user(&row))),
        None => Ok(None),
    }
}

async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, name, email, password_hash, is_admin FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user(&row))),
        None => Ok(None),
    }
}

async fn list_users(pool: &SqlitePool, owner: Option<i64>) -> Result<Vec<User>> {
    let rows = match owner {
        Some(id) => {
            sqlx::query("SELECT id, name, email, password_hash, is_admin FROM users WHERE id = ? ORDER BY id")
                .bind(id)
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query("SELECT id, name, email, password_hash, is_admin FROM users ORDER BY id")
                .fetch_all(pool)
                .await
        }
    }
    .context("Failed to list users")?;

    Ok(rows.iter().map(row_to_user).collect())
}

async fn update_user(pool: &SqlitePool, user: &User) -> Result<User> {
    sqlx::query(
        r#"
        UPDATE users
        SET name = ?, email = ?, password_hash = ?, is_admin = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_admin)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_by_id(pool, user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn delete_user(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(())
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_admin: row.get("is_admin"),
    }
}
