//! Post model

use crate::models::Localized;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Publication state shared by posts and pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    Draft,
    Published,
    Archived,
}

impl PublishState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishState::Draft => "draft",
            PublishState::Published => "published",
            PublishState::Archived => "archived",
        }
    }
}

impl Default for PublishState {
    fn default() -> Self {
        Self::Draft
    }
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PublishState::Draft),
            "published" => Ok(PublishState::Published),
            "archived" => Ok(PublishState::Archived),
            _ => Err(anyhow::anyhow!("Invalid publish state: {}", s)),
        }
    }
}

/// Post entity.
///
/// Title and excerpt are required in all three locales; content may be
/// translated incrementally. The slug is derived from the English title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// Localized title
    pub title: Localized<String>,
    /// URL slug (unique, from the English title)
    pub slug: String,
    /// Publication state
    pub state: PublishState,
    /// Author user ID
    pub author_id: i64,
    /// Category IDs (at least one)
    pub category_ids: Vec<i64>,
    /// Localized excerpt shown in listings
    pub excerpt: Localized<String>,
    /// Localized rich-text body (per-locale optional)
    pub content: Localized<Option<String>>,
    /// Stored thumbnail filename, if any
    pub thumbnail: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        title: Localized<String>,
        slug: String,
        author_id: i64,
        excerpt: Localized<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            title,
            slug,
            state: PublishState::Draft,
            author_id,
            category_ids: Vec::new(),
            excerpt,
            content: Localized::default(),
            thumbnail: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a post.
///
/// Wire names follow the schema registry: relationships are `author` and
/// `categories`, carrying IDs.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    pub title: Localized<String>,
    pub excerpt: Localized<String>,
    #[serde(default)]
    pub content: Localized<Option<String>>,
    /// Explicit slug; derived from the English title when omitted
    pub slug: Option<String>,
    /// Author user ID; defaults to the caller when omitted
    #[serde(rename = "author")]
    pub author_id: Option<i64>,
    #[serde(default, rename = "categories")]
    pub category_ids: Vec<i64>,
    pub state: Option<PublishState>,
    /// Stored filename returned by the upload endpoint
    pub thumbnail: Option<String>,
}

/// Input for updating a post; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<Localized<String>>,
    pub slug: Option<String>,
    pub excerpt: Option<Localized<String>>,
    pub content: Option<Localized<Option<String>>>,
    #[serde(rename = "author")]
    pub author_id: Option<i64>,
    #[serde(rename = "categories")]
    pub category_ids: Option<Vec<i64>>,
    pub state: Option<PublishState>,
    pub thumbnail: Option<String>,
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Map the items, keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}
