//! Menu model
//!
//! A menu is a free-text block per locale (rendered site navigation or
//! footer copy), not a structured list of items.

use crate::models::Localized;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Menu entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    /// Unique identifier
    pub id: i64,
    /// Localized free-text body
    pub body: Localized<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Menu {
    pub fn new(body: Localized<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            body,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a menu
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMenuInput {
    pub body: Localized<String>,
}

/// Input for updating a menu
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMenuInput {
    pub body: Option<Localized<String>>,
}
