//! Post API endpoints
//!
//! Handles HTTP requests for posts:
//! - GET /api/v1/posts - List posts (paginated, filterable by state and category)
//! - GET /api/v1/posts/{slug} - Get a post by slug
//! - POST /api/v1/posts - Create a post
//! - PUT /api/v1/posts/{id} - Update a post
//! - DELETE /api/v1/posts/{id} - Delete a post
//!
//! Reads are public and include drafts; clients that only want published
//! content filter with `?state=published`. Mutations require a session,
//! and members may only touch their own posts.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::access::Operation;
use crate::api::common::{self, default_page, default_per_page};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{PostListResponse, PostResponse};
use crate::db::repositories::PostFilter;
use crate::models::{CreatePostInput, ListParams, PublishState, UpdatePostInput};
use crate::services::PostServiceError;

/// Query parameters for listing posts
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Filter by publication state ("draft", "published" or "archived")
    pub state: Option<String>,
    /// Filter by category id
    pub category: Option<i64>,
}

/// Build public post routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/{slug}", get(get_post))
}

/// Build protected post routes (requires auth middleware)
///
/// Mutations address posts by numeric id. The parameter keeps the
/// `{slug}` name because the merged router allows only one name per
/// path position under `/posts`.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post))
        .route("/{slug}", axum::routing::put(update_post).delete(delete_post))
}

/// GET /api/v1/posts - List posts
async fn list_posts(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let decision = common::authorize(&state.policies, "post", Operation::Read, user.as_ref())?;

    let state_filter = query
        .state
        .as_deref()
        .map(PublishState::from_str)
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let filter = PostFilter {
        owner: decision.owner_filter(),
        state: state_filter,
        category_id: query.category,
    };
    let params = ListParams::new(query.page, query.per_page);

    let result = state
        .post_service
        .list(&filter, &params)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let total_pages = result.total_pages();
    Ok(Json(PostListResponse {
        posts: result
            .items
            .into_iter()
            .map(|p| PostResponse::from(p).with_thumbnail_url(&state.files))
            .collect(),
        total: result.total,
        page: result.page,
        per_page: result.per_page,
        total_pages,
    }))
}

/// GET /api/v1/posts/{slug} - Get a post by slug
async fn get_post(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Path(slug): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    common::authorize(&state.policies, "post", Operation::Read, user.as_ref())?;

    let found = state
        .post_service
        .get_by_slug(&slug)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(PostResponse::from(found).with_thumbnail_url(&state.files)))
}

/// POST /api/v1/posts - Create a post
///
/// Omitting `author` attributes the post to the caller.
async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(mut payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    common::authorize(&state.policies, "post", Operation::Create, Some(&user))?;

    if let Some(map) = payload.as_object_mut() {
        let missing_author = map.get("author").map(|v| v.is_null()).unwrap_or(true);
        if missing_author {
            map.insert("author".to_string(), serde_json::json!(user.0.id));
        }
    }

    common::check_create(&state.registry, "post", &payload)?;
    let input: CreatePostInput = common::decode(payload)?;

    let created = state
        .post_service
        .create(input)
        .await
        .map_err(map_post_error)?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse::from(created).with_thumbnail_url(&state.files)),
    ))
}

/// PUT /api/v1/posts/{id} - Update a post
async fn update_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<PostResponse>, ApiError> {
    let decision = common::authorize(&state.policies, "post", Operation::Update, Some(&user))?;

    let existing = state
        .post_service
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    if !decision.permits(Some(existing.author_id)) {
        return Err(ApiError::forbidden("Not allowed to update this post"));
    }

    common::check_update(&state.registry, "post", &payload)?;
    let input: UpdatePostInput = common::decode(payload)?;

    let updated = state
        .post_service
        .update(id, input)
        .await
        .map_err(map_post_error)?;

    Ok(Json(PostResponse::from(updated).with_thumbnail_url(&state.files)))
}

/// DELETE /api/v1/posts/{id} - Delete a post (admin only)
async fn delete_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    common::authorize(&state.policies, "post", Operation::Delete, Some(&user))?;

    state.post_service.delete(id).await.map_err(|e| match e {
        PostServiceError::NotFound => ApiError::not_found("Post not found"),
        _ => ApiError::internal_error(e.to_string()),
    })?;

    Ok(StatusCode::NO_CONTENT)
}

fn map_post_error(e: PostServiceError) -> ApiError {
    match e {
        PostServiceError::NotFound => ApiError::not_found("Post not found"),
        PostServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        PostServiceError::DuplicateSlug(slug) => ApiError::with_details(
            "CONFLICT",
            format!("Slug '{}' is already in use", slug),
            serde_json::json!({ "field": "slug", "value": slug }),
        ),
        PostServiceError::UnknownAuthor(_) | PostServiceError::UnknownCategory(_) => {
            ApiError::validation_error(e.to_string())
        }
        PostServiceError::InternalError(_) => ApiError::internal_error(e.to_string()),
    }
}
