//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod category;
pub mod menu;
pub mod page;
pub mod post;
pub mod session;
pub mod user;

pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use menu::{MenuRepository, SqlxMenuRepository};
pub use page::{PageRepository, SqlxPageRepository};
pub use post::{PostFilter, PostRepository, SqlxPostRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
