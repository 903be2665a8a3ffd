//! Category model

use crate::models::Localized;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Localized name
    pub name: Localized<String>,
    /// URL slug (unique, from the English name)
    pub slug: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: Localized<String>, slug: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            name,
            slug,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a category
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    pub name: Localized<String>,
    /// Explicit slug; derived from the English name when omitted
    pub slug: Option<String>,
}

/// Input for updating a category; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<Localized<String>>,
    pub slug: Option<String>,
}
