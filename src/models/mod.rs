//! Data models
//!
//! This module contains the data structures used throughout the backend:
//! - Content entities (User, Post, Category, Page, Menu, Session)
//! - Locale-aware text (`Locale`, `Localized<T>`)
//! - Input and pagination types shared by services and the API layer

mod category;
mod locale;
mod menu;
mod page;
mod post;
mod session;
mod user;

pub use category::{Category, CreateCategoryInput, UpdateCategoryInput};
pub use locale::{Locale, Localized};
pub use menu::{CreateMenuInput, Menu, UpdateMenuInput};
pub use page::{CreatePageInput, Page, UpdatePageInput};
pub use post::{CreatePostInput, ListParams, PagedResult, Post, PublishState, UpdatePostInput};
pub use session::Session;
pub use user::{CreateUserInput, UpdateUserInput, User};
