//! User service
//!
//! Business logic for accounts and authentication: creation with email
//! uniqueness, credential login issuing session tokens, session
//! validation with expiry cleanup, and the usual CRUD. Who may call
//! which operation is decided by the access policy at the API layer;
//! this service only enforces data integrity.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, UpdateUserInput, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email already registered
    #[error("Email '{0}' is already registered")]
    EmailTaken(String),

    /// User not found
    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing accounts and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_ttl_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_ttl_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_ttl_days,
        }
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if email or password is empty
    /// - `EmailTaken` if the email is already registered
    /// - `InternalError` for database errors
    pub async fn create(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        if input.email.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email cannot be empty".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::EmailTaken(input.email));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(input.name, input.email, password_hash, input.is_admin);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!("Created user {} ({})", created.id, created.email);
        Ok(created)
    }

    /// Login with email and password, creating a session on success.
    ///
    /// # Errors
    ///
    /// - `AuthenticationError` if the credentials are invalid; the same
    ///   message is used for unknown email and wrong password
    /// - `InternalError` for database errors
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, Session), UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid email or password".to_string())
            })?;

        let password_valid =
            verify_password(password, &user.password_hash).context("Failed to verify password")?;
        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid email or password".to_string(),
            ));
        }

        let session = Session::new(user.id, self.session_ttl_days);
        let session = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        tracing::debug!("User {} logged in", user.id);
        Ok((user, session))
    }

    /// Logout (invalidate the session token)
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Validate a session token and return the associated user.
    ///
    /// Returns `None` for unknown or expired tokens; expired sessions
    /// are removed on sight.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;
        Ok(user)
    }

    /// List users, optionally restricted to a single owner's row
    pub async fn list(&self, owner: Option<i64>) -> Result<Vec<User>, UserServiceError> {
        let users = self
            .user_repo
            .list(owner)
            .await
            .context("Failed to list users")?;
        Ok(users)
    }

    /// Update a user.
    ///
    /// Absent fields keep their current values; a new password is hashed
    /// here. Changing the email re-checks uniqueness.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateUserInput,
    ) -> Result<User, UserServiceError> {
        let mut user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        if let Some(email) = input.email {
            if email.trim().is_empty() {
                return Err(UserServiceError::ValidationError(
                    "Email cannot be empty".to_string(),
                ));
            }
            if email != user.email {
                if self
                    .user_repo
                    .get_by_email(&email)
                    .await
                    .context("Failed to check email")?
                    .is_some()
                {
                    return Err(UserServiceError::EmailTaken(email));
                }
                user.email = email;
            }
        }
        if let Some(name) = input.name {
            user.name = Some(name);
        }
        if let Some(password) = input.password {
            if password.is_empty() {
                return Err(UserServiceError::ValidationError(
                    "Password cannot be empty".to_string(),
                ));
            }
            user.password_hash = hash_password(&password).context("Failed to hash password")?;
        }
        if let Some(is_admin) = input.is_admin {
            user.is_admin = is_admin;
        }

        let updated = self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;
        Ok(updated)
    }

    /// Delete a user. Their sessions go with them.
    pub async fn delete(&self, id: i64) -> Result<(), UserServiceError> {
        if self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .is_none()
        {
            return Err(UserServiceError::NotFound);
        }

        self.user_repo
            .delete(id)
            .await
            .context("Failed to delete user")?;

        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Delete all expired sessions, returning how many were removed.
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }
}
