//! Shared API response types
//!
//! This module contains common response structures used across multiple API
//! endpoints to ensure consistency and reduce code duplication. Localized
//! fields serialize as nested `{"en", "vi", "fr"}` objects; relationship
//! fields carry IDs under their schema names (`author`, `categories`).

use serde::Serialize;

use crate::models::{Category, Localized, Menu, Page, Post, User};
use crate::services::FileStore;

// ============================================================================
// User
// ============================================================================

/// User response; the password hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

// ============================================================================
// Post
// ============================================================================

/// Full post response
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: Localized<String>,
    pub slug: String,
    pub state: String,
    pub author: i64,
    pub categories: Vec<i64>,
    pub excerpt: Localized<String>,
    pub content: Localized<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            state: post.state.to_string(),
            author: post.author_id,
            categories: post.category_ids,
            excerpt: post.excerpt,
            content: post.content,
            thumbnail: post.thumbnail,
            thumbnail_url: None,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

impl PostResponse {
    /// Resolve the stored thumbnail filename to its public URL.
    pub fn with_thumbnail_url(mut self, files: &FileStore) -> Self {
        self.thumbnail_url = self.thumbnail.as_deref().map(|name| files.url_for(name));
        self
    }
}

/// Paginated post list response
#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

// ============================================================================
// Category
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: Localized<String>,
    pub slug: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            created_at: category.created_at.to_rfc3339(),
            updated_at: category.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Page
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub id: i64,
    pub title: Localized<String>,
    pub slug: String,
    pub state: String,
    pub author: i64,
    pub content: Localized<Option<String>>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            title: page.title,
            slug: page.slug,
            state: page.state.to_string(),
            author: page.author_id,
            content: page.content,
            created_at: page.created_at.to_rfc3339(),
            updated_at: page.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Menu
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub id: i64,
    pub body: Localized<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Menu> for MenuResponse {
    fn from(menu: Menu) -> Self {
        Self {
            id: menu.id,
            body: menu.body,
            created_at: menu.created_at.to_rfc3339(),
            updated_at: menu.updated_at.to_rfc3339(),
        }
    }
}
