//! Menu API endpoints
//!
//! Handles HTTP requests for navigation menus:
//! - GET /api/v1/menus - List menus
//! - GET /api/v1/menus/{id} - Get a menu
//! - POST /api/v1/menus - Create a menu
//! - PUT /api/v1/menus/{id} - Update a menu
//! - DELETE /api/v1/menus/{id} - Delete a menu
//!
//! Menus carry no slug and no owner; they are addressed by id and only
//! admins may change them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use crate::access::Operation;
use crate::api::common;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::MenuResponse;
use crate::models::{CreateMenuInput, UpdateMenuInput};
use crate::services::MenuServiceError;

/// Build public menu routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_menus))
        .route("/{id}", get(get_menu))
}

/// Build protected menu routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_menu))
        .route("/{id}", put(update_menu).delete(delete_menu))
}

/// GET /api/v1/menus - List menus
async fn list_menus(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
) -> Result<Json<Vec<MenuResponse>>, ApiError> {
    common::authorize(&state.policies, "menu", Operation::Read, user.as_ref())?;

    let menus = state
        .menu_service
        .list()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(menus.into_iter().map(MenuResponse::from).collect()))
}

/// GET /api/v1/menus/{id} - Get a menu
async fn get_menu(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<MenuResponse>, ApiError> {
    common::authorize(&state.policies, "menu", Operation::Read, user.as_ref())?;

    let found = state
        .menu_service
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Menu not found"))?;

    Ok(Json(found.into()))
}

/// POST /api/v1/menus - Create a menu (admin only)
async fn create_menu(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    common::authorize(&state.policies, "menu", Operation::Create, Some(&user))?;
    common::check_create(&state.registry, "menu", &payload)?;
    let input: CreateMenuInput = common::decode(payload)?;

    let created = state
        .menu_service
        .create(input)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(MenuResponse::from(created))))
}

/// PUT /api/v1/menus/{id} - Update a menu
async fn update_menu(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<MenuResponse>, ApiError> {
    let decision = common::authorize(&state.policies, "menu", Operation::Update, Some(&user))?;
    if !decision.permits(None) {
        return Err(ApiError::forbidden("Not allowed to update menus"));
    }

    common::check_update(&state.registry, "menu", &payload)?;
    let input: UpdateMenuInput = common::decode(payload)?;

    let updated = state
        .menu_service
        .update(id, input)
        .await
        .map_err(|e| match e {
            MenuServiceError::NotFound => ApiError::not_found("Menu not found"),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/menus/{id} - Delete a menu (admin only)
async fn delete_menu(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    common::authorize(&state.policies, "menu", Operation::Delete, Some(&user))?;

    state.menu_service.delete(id).await.map_err(|e| match e {
        MenuServiceError::NotFound => ApiError::not_found("Menu not found"),
        _ => ApiError::internal_error(e.to_string()),
    })?;

    Ok(StatusCode::NO_CONTENT)
}
