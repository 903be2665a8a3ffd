//! Common API utilities and shared types
//!
//! This module contains shared utilities used across multiple API endpoints.

use serde_json::Value;

use crate::access::{AccessDecision, Identity, Operation, PolicyTable};
use crate::api::middleware::{ApiError, AuthenticatedUser};
use crate::schema::SchemaRegistry;

// ============================================================================
// Pagination Defaults
// ============================================================================

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size
pub fn default_per_page() -> u32 {
    10
}

// ============================================================================
// Authorization
// ============================================================================

/// Evaluate the policy table for a caller and map denial to the HTTP
/// error model: no identity gets 401, an authenticated but denied caller
/// gets 403. A denied request never reaches a service.
pub fn authorize(
    policies: &PolicyTable,
    entity: &str,
    operation: Operation,
    user: Option<&AuthenticatedUser>,
) -> Result<AccessDecision, ApiError> {
    let identity = user.map(|u| Identity::from(&u.0));
    let decision = policies.decide(entity, operation, identity.as_ref());
    if decision.is_deny() {
        return Err(match user {
            None => ApiError::unauthorized("Authentication required"),
            Some(_) => ApiError::forbidden(format!("Not allowed to {} {}", operation, entity)),
        });
    }
    Ok(decision)
}

// ============================================================================
// Payload validation
// ============================================================================

/// Run a create payload through the schema registry.
pub fn check_create(
    registry: &SchemaRegistry,
    entity: &str,
    payload: &Value,
) -> Result<(), ApiError> {
    registry
        .check_create(entity, payload)
        .map_err(|e| ApiError::with_details("VALIDATION_ERROR", e.to_string(), e.details()))
}

/// Run an update payload through the schema registry.
pub fn check_update(
    registry: &SchemaRegistry,
    entity: &str,
    payload: &Value,
) -> Result<(), ApiError> {
    registry
        .check_update(entity, payload)
        .map_err(|e| ApiError::with_details("VALIDATION_ERROR", e.to_string(), e.details()))
}

/// Decode a registry-checked payload into a typed input.
pub fn decode<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, ApiError> {
    serde_json::from_value(payload)
        .map_err(|e| ApiError::validation_error(format!("Invalid payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn caller(id: i64, is_admin: bool) -> AuthenticatedUser {
        let mut user = User::new(
            None,
            format!("u{}@example.com", id),
            "hash".to_string(),
            is_admin,
        );
        user.id = id;
        AuthenticatedUser(user)
    }

    #[test]
    fn test_authorize_public_read_without_identity() {
        let policies = PolicyTable::cms();
        let decision = authorize(&policies, "post", Operation::Read, None).unwrap();
        assert!(decision.allows_all());
    }

    #[test]
    fn test_authorize_maps_missing_identity_to_401() {
        let policies = PolicyTable::cms();
        let err = authorize(&policies, "post", Operation::Create, None).unwrap_err();
        assert_eq!(err.error.code, "UNAUTHORIZED");
    }

    #[test]
    fn test_authorize_maps_denied_identity_to_403() {
        let policies = PolicyTable::cms();
        let member = caller(2, false);
        let err = authorize(&policies, "post", Operation::Create, Some(&member)).unwrap_err();
        assert_eq!(err.error.code, "FORBIDDEN");
    }

    #[test]
    fn test_authorize_scopes_member_reads_of_users() {
        let policies = PolicyTable::cms();
        let member = caller(5, false);
        let decision = authorize(&policies, "user", Operation::Read, Some(&member)).unwrap();
        assert_eq!(decision.owner_filter(), Some(5));
    }

    #[test]
    fn test_authorize_admin_passes_everywhere() {
        let policies = PolicyTable::cms();
        let admin = caller(1, true);
        for operation in [
            Operation::Read,
            Operation::Create,
            Operation::Update,
            Operation::Delete,
        ] {
            let decision =
                authorize(&policies, "post", operation, Some(&admin)).expect("admin allowed");
            assert!(decision.allows_all());
        }
    }

    #[test]
    fn test_check_create_carries_field_details() {
        let registry = crate::schema::cms_registry();
        let err = check_create(&registry, "user", &serde_json::json!({})).unwrap_err();
        assert_eq!(err.error.code, "VALIDATION_ERROR");
        assert!(err.error.details.as_ref().unwrap().is_array());
    }
}
