//! Page model for standalone pages (about, contact, ...)

use crate::models::{Localized, PublishState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
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
    /// Localized rich-text body (per-locale optional)
    pub content: Localized<Option<String>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn new(title: Localized<String>, slug: String, author_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            title,
            slug,
            state: PublishState::Draft,
            author_id,
            content: Localized::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a page
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePageInput {
    pub title: Localized<String>,
    #[serde(default)]
    pub content: Localized<Option<String>>,
    /// Explicit slug; derived from the English title when omitted
    pub slug: Option<String>,
    /// Author user ID; defaults to the caller when omitted
    #[serde(rename = "author")]
    pub author_id: Option<i64>,
    pub state: Option<PublishState>,
}

/// Input for updating a page; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePageInput {
    pub title: Option<Localized<String>>,
    pub slug: Option<String>,
    pub content: Option<Localized<Option<String>>>,
    #[serde(rename = "author")]
    pub author_id: Option<i64>,
    pub state: Option<PublishState>,
}
