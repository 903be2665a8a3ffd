//! User management API endpoints
//!
//! Handles HTTP requests for user accounts:
//! - GET /api/v1/users - List users
//! - POST /api/v1/users - Create a user
//! - GET /api/v1/users/{id} - Get a user
//! - PUT /api/v1/users/{id} - Update a user
//! - DELETE /api/v1/users/{id} - Delete a user
//!
//! Every route requires authentication. Members see and edit only their
//! own record; creating and deleting accounts is admin work.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::access::Operation;
use crate::api::common;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserResponse;
use crate::models::{CreateUserInput, UpdateUserInput};
use crate::services::UserServiceError;

/// Build the users router (mounted behind the auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// GET /api/v1/users - List users
///
/// Admins see every account; members get a list containing only their own.
async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let decision = common::authorize(&state.policies, "user", Operation::Read, Some(&user))?;

    let users = state
        .user_service
        .list(decision.owner_filter())
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/v1/users - Create a user (admin only)
async fn create_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    common::authorize(&state.policies, "user", Operation::Create, Some(&user))?;
    common::check_create(&state.registry, "user", &payload)?;
    let input: CreateUserInput = common::decode(payload)?;

    let created = state.user_service.create(input).await.map_err(|e| match e {
        UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        UserServiceError::EmailTaken(_) => ApiError::conflict(e.to_string()),
        _ => ApiError::internal_error(e.to_string()),
    })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

/// GET /api/v1/users/{id} - Get a user
async fn get_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let decision = common::authorize(&state.policies, "user", Operation::Read, Some(&user))?;
    if !decision.permits(Some(id)) {
        return Err(ApiError::forbidden("Not allowed to read this user"));
    }

    let found = state
        .user_service
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(found.into()))
}

/// PUT /api/v1/users/{id} - Update a user
///
/// Members may edit their own record but never the admin flag; that
/// includes stripping it from themselves.
async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<UserResponse>, ApiError> {
    let decision = common::authorize(&state.policies, "user", Operation::Update, Some(&user))?;
    if !decision.permits(Some(id)) {
        return Err(ApiError::forbidden("Not allowed to update this user"));
    }

    let touches_admin_flag = payload
        .get("is_admin")
        .map(|v| !v.is_null())
        .unwrap_or(false);
    if touches_admin_flag && !user.0.is_admin {
        return Err(ApiError::forbidden(
            "Only administrators can change the admin flag",
        ));
    }

    common::check_update(&state.registry, "user", &payload)?;
    let input: UpdateUserInput = common::decode(payload)?;

    let updated = state
        .user_service
        .update(id, input)
        .await
        .map_err(|e| match e {
            UserServiceError::NotFound => ApiError::not_found("User not found"),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::EmailTaken(_) => ApiError::conflict(e.to_string()),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/users/{id} - Delete a user (admin only)
async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    common::authorize(&state.policies, "user", Operation::Delete, Some(&user))?;

    state.user_service.delete(id).await.map_err(|e| match e {
        UserServiceError::NotFound => ApiError::not_found("User not found"),
        _ => ApiError::internal_error(e.to_string()),
    })?;

    Ok(StatusCode::NO_CONTENT)
}
