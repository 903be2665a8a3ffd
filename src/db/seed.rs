//! First-run database seeding
//!
//! When the users table is empty the instance is considered fresh: an
//! admin account is created from `[seed]` config and a starter category
//! is inserted so posts have something to attach to. Any other state is
//! a no-op, so running at every startup is safe.

use crate::config::SeedConfig;
use crate::services::password::hash_password;
use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

/// Seed initial data if the database has no users.
///
/// Returns `true` if seeding ran. Errors abort startup; a half-seeded
/// database is worse than a failed boot.
pub async fn run(pool: &SqlitePool, config: &SeedConfig) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    let count: i64 = row.get("count");

    if count > 0 {
        tracing::debug!("Users exist, skipping seed");
        return Ok(false);
    }

    if config.uses_default_password() {
        tracing::warn!(
            "Seeding admin '{}' with the default password; change it after first login",
            config.admin_email
        );
    }

    let password_hash =
        hash_password(&config.admin_password).context("Failed to hash seed admin password")?;

    sqlx::query("INSERT INTO users (name, email, password_hash, is_admin) VALUES (?, ?, ?, 1)")
        .bind(&config.admin_name)
        .bind(&config.admin_email)
        .bind(&password_hash)
        .execute(pool)
        .await
        .context("Failed to create seed admin user")?;

    sqlx::query("INSERT INTO categories (name_en, name_vi, name_fr, slug) VALUES (?, ?, ?, ?)")
        .bind("General")
        .bind("Chung")
        .bind("Général")
        .bind("general")
        .execute(pool)
        .await
        .context("Failed to create seed category")?;

    tracing::info!("Seeded admin user '{}' and starter category", config.admin_email);

    Ok(true)
}
