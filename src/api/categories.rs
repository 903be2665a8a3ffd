//! Category API endpoints
//!
//! Handles HTTP requests for categories:
//! - GET /api/v1/categories - List categories
//! - GET /api/v1/categories/{slug} - Get a category by slug
//! - POST /api/v1/categories - Create a category
//! - PUT /api/v1/categories/{id} - Update a category
//! - DELETE /api/v1/categories/{id} - Delete a category
//!
//! Categories have no owner, so the owner-or-admin update rule resolves
//! to admin only.

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
use crate::api::responses::CategoryResponse;
use crate::models::{CreateCategoryInput, UpdateCategoryInput};
use crate::services::CategoryServiceError;

/// Build public category routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/{slug}", get(get_category))
}

/// Build protected category routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category))
        .route("/{slug}", put(update_category).delete(delete_category))
}

/// GET /api/v1/categories - List categories
async fn list_categories(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    common::authorize(&state.policies, "category", Operation::Read, user.as_ref())?;

    let categories = state
        .category_service
        .list()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// GET /api/v1/categories/{slug} - Get a category by slug
async fn get_category(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    common::authorize(&state.policies, "category", Operation::Read, user.as_ref())?;

    let found = state
        .category_service
        .get_by_slug(&slug)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    Ok(Json(found.into()))
}

/// POST /api/v1/categories - Create a category (admin only)
async fn create_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    common::authorize(&state.policies, "category", Operation::Create, Some(&user))?;
    common::check_create(&state.registry, "category", &payload)?;
    let input: CreateCategoryInput = common::decode(payload)?;

    let created = state
        .category_service
        .create(input)
        .await
        .map_err(map_category_error)?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(created))))
}

/// PUT /api/v1/categories/{id} - Update a category
async fn update_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let decision =
        common::authorize(&state.policies, "category", Operation::Update, Some(&user))?;
    if !decision.permits(None) {
        return Err(ApiError::forbidden("Not allowed to update categories"));
    }

    common::check_update(&state.registry, "category", &payload)?;
    let input: UpdateCategoryInput = common::decode(payload)?;

    let updated = state
        .category_service
        .update(id, input)
        .await
        .map_err(map_category_error)?;

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/categories/{id} - Delete a category (admin only)
///
/// Fails with a conflict while posts still reference the category.
async fn delete_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    common::authorize(&state.policies, "category", Operation::Delete, Some(&user))?;

    state
        .category_service
        .delete(id)
        .await
        .map_err(map_category_error)?;

    Ok(StatusCode::NO_CONTENT)
}

fn map_category_error(e: CategoryServiceError) -> ApiError {
    match e {
        CategoryServiceError::NotFound => ApiError::not_found("Category not found"),
        CategoryServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        CategoryServiceError::DuplicateSlug(slug) => ApiError::with_details(
            "CONFLICT",
            format!("Slug '{}' is already in use", slug),
            serde_json::json!({ "field": "slug", "value": slug }),
        ),
        CategoryServiceError::InUse { posts, .. } => ApiError::with_details(
            "CONFLICT",
            e.to_string(),
            serde_json::json!({ "posts": posts }),
        ),
        CategoryServiceError::InternalError(_) => ApiError::internal_error(e.to_string()),
    }
}
