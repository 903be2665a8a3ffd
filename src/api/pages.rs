//! Page API endpoints
//!
//! Handles HTTP requests for standalone pages:
//! - GET /api/v1/pages - List pages (filterable by state)
//! - GET /api/v1/pages/{slug} - Get a page by slug
//! - POST /api/v1/pages - Create a page
//! - PUT /api/v1/pages/{id} - Update a page
//! - DELETE /api/v1/pages/{id} - Delete a page

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::access::Operation;
use crate::api::common;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::PageResponse;
use crate::models::{CreatePageInput, PublishState, UpdatePageInput};
use crate::services::PageServiceError;

/// Query parameters for listing pages
#[derive(Debug, Deserialize)]
pub struct ListPagesQuery {
    /// Filter by publication state ("draft", "published" or "archived")
    pub state: Option<String>,
}

/// Build public page routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pages))
        .route("/{slug}", get(get_page))
}

/// Build protected page routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_page))
        .route("/{slug}", put(update_page).delete(delete_page))
}

/// GET /api/v1/pages - List pages
async fn list_pages(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Query(query): Query<ListPagesQuery>,
) -> Result<Json<Vec<PageResponse>>, ApiError> {
    let decision = common::authorize(&state.policies, "page", Operation::Read, user.as_ref())?;

    let state_filter = query
        .state
        .as_deref()
        .map(PublishState::from_str)
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let pages = state
        .page_service
        .list(decision.owner_filter(), state_filter)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(pages.into_iter().map(PageResponse::from).collect()))
}

/// GET /api/v1/pages/{slug} - Get a page by slug
async fn get_page(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Path(slug): Path<String>,
) -> Result<Json<PageResponse>, ApiError> {
    common::authorize(&state.policies, "page", Operation::Read, user.as_ref())?;

    let found = state
        .page_service
        .get_by_slug(&slug)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    Ok(Json(found.into()))
}

/// POST /api/v1/pages - Create a page
///
/// Omitting `author` attributes the page to the caller.
async fn create_page(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(mut payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    common::authorize(&state.policies, "page", Operation::Create, Some(&user))?;

    if let Some(map) = payload.as_object_mut() {
        let missing_author = map.get("author").map(|v| v.is_null()).unwrap_or(true);
        if missing_author {
            map.insert("author".to_string(), serde_json::json!(user.0.id));
        }
    }

    common::check_create(&state.registry, "page", &payload)?;
    let input: CreatePageInput = common::decode(payload)?;

    let created = state
        .page_service
        .create(input)
        .await
        .map_err(map_page_error)?;

    Ok((StatusCode::CREATED, Json(PageResponse::from(created))))
}

/// PUT /api/v1/pages/{id} - Update a page
async fn update_page(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<PageResponse>, ApiError> {
    let decision = common::authorize(&state.policies, "page", Operation::Update, Some(&user))?;

    let existing = state
        .page_service
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;
    if !decision.permits(Some(existing.author_id)) {
        return Err(ApiError::forbidden("Not allowed to update this page"));
    }

    common::check_update(&state.registry, "page", &payload)?;
    let input: UpdatePageInput = common::decode(payload)?;

    let updated = state
        .page_service
        .update(id, input)
        .await
        .map_err(map_page_error)?;

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/pages/{id} - Delete a page (admin only)
async fn delete_page(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    common::authorize(&state.policies, "page", Operation::Delete, Some(&user))?;

    state.page_service.delete(id).await.map_err(|e| match e {
        PageServiceError::NotFound => ApiError::not_found("Page not found"),
        _ => ApiError::internal_error(e.to_string()),
    })?;

    Ok(StatusCode::NO_CONTENT)
}

fn map_page_error(e: PageServiceError) -> ApiError {
    match e {
        PageServiceError::NotFound => ApiError::not_found("Page not found"),
        PageServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        PageServiceError::DuplicateSlug(slug) => ApiError::with_details(
            "CONFLICT",
            format!("Slug '{}' is already in use", slug),
            serde_json::json!({ "field": "slug", "value": slug }),
        ),
        PageServiceError::UnknownAuthor(_) => ApiError::validation_error(e.to_string()),
        PageServiceError::InternalError(_) => ApiError::internal_error(e.to_string()),
    }
}
