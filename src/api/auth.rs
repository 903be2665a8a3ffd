//! Authentication API endpoints
//!
//! Handles HTTP requests for session management:
//! - POST /api/v1/auth/login - Start a session
//! - POST /api/v1/auth/logout - End the current session
//! - GET /api/v1/auth/me - Get current user

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{token_from_headers, ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserResponse;
use crate::services::UserServiceError;

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
}

/// POST /api/v1/auth/login - Start a session
///
/// The token is returned in the body and also set as a `session` cookie,
/// so both header-based and cookie-based clients work.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state
        .user_service
        .login(&body.email, &body.password)
        .await
        .map_err(|e| match e {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    // Set session cookie
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id,
        state.session_ttl_days * 24 * 60 * 60
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, HeaderValue::from_str(&cookie).unwrap());

    Ok((
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/logout - End the current session
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = token_from_headers(&headers) {
        state
            .user_service
            .logout(&token)
            .await
            .map_err(|e| ApiError::internal_error(e.to_string()))?;
    }

    // Clear the session cookie
    let cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_static(cookie));

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me - Get current user
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}
