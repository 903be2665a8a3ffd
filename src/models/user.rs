//! User model

use serde::{Deserialize, Serialize};

/// User entity.
///
/// The email address is the login identifier; the admin flag is the only
/// authorization attribute. Users carry no created/updated tracking, only
/// the content entities do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name (optional)
    pub name: Option<String>,
    /// Email address (unique, login identifier)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Administrator flag
    pub is_admin: bool,
}

impl User {
    /// Create a new User.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(name: Option<String>, email: String, password_hash: String, is_admin: bool) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
            email,
            password_hash,
            is_admin,
        }
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    /// Display name (optional)
    #[serde(default)]
    pub name: Option<String>,
    /// Email address
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    /// Administrator flag (defaults to false)
    #[serde(default)]
    pub is_admin: bool,
}

impl CreateUserInput {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
            password: password.into(),
            is_admin: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

/// Input for updating a user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    /// New display name (optional)
    pub name: Option<String>,
    /// New email (optional)
    pub email: Option<String>,
    /// New password (optional, will be hashed)
    pub password: Option<String>,
    /// New admin flag (optional; only admins may set it)
    pub is_admin: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            Some("Test".to_string()),
            "test@example.com".to_string(),
            "hashed_password".to_string(),
            false,
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.name.as_deref(), Some("Test"));
        assert_eq!(user.email, "test@example.com");
        assert!(!user.is_admin);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new(None, "a@b.c".to_string(), "secret-hash".to_string(), true);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn test_create_input_builder() {
        let input = CreateUserInput::new("admin@example.com", "pw")
            .with_name("Admin")
            .admin();
        assert_eq!(input.email, "admin@example.com");
        assert_eq!(input.name.as_deref(), Some("Admin"));
        assert!(input.is_admin);
    }
}
