//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session entity for authenticated callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session token (uuid v4)
    pub id: String,
    /// Associated user ID
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session for the user with the given lifetime.
    pub fn new(user_id: i64, ttl_days: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(ttl_days),
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_new() {
        let session = Session::new(7, 7);
        assert_eq!(session.user_id, 7);
        assert!(!session.is_expired());
        assert!(session.expires_at > session.created_at);
    }

    #[test]
    fn test_session_expiry() {
        let mut session = Session::new(1, 7);
        session.expires_at = Utc::now() - Duration::hours(1);
        assert!(session.is_expired());
    }
}
