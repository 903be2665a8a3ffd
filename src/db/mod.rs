//! Database layer
//!
//! SQLite via sqlx, organized as:
//! - `pool`: connection pool construction (plus an in-memory pool for tests)
//! - `migrations`: embedded, versioned schema migrations
//! - `seed`: first-run admin and starter-content creation
//! - `repositories`: trait-based data access per entity
//!
//! ```ignore
//! use triptych::config::DatabaseConfig;
//! use triptych::db::{create_pool, run_migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;
pub mod seed;

pub use migrations::run_migrations;
pub use pool::{create_pool, create_test_pool};
