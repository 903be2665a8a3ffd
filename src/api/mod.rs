//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the CMS backend:
//! - Schema introspection
//! - Auth endpoints (login, logout, current user)
//! - User management endpoints
//! - Post, category, page and menu endpoints
//! - Upload endpoints and static file serving
//!
//! Routes split into a public group and a protected group merged into
//! one router. The protected group sits behind [`middleware::require_auth`];
//! the public group runs [`middleware::optional_auth`] so read handlers
//! see the caller's identity when a session is presented. Handlers check
//! the policy table before touching a service.

pub mod auth;
pub mod categories;
pub mod common;
pub mod menus;
pub mod middleware;
pub mod pages;
pub mod posts;
pub mod responses;
pub mod schema;
pub mod uploads;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (mutations and account management)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/users", users::router())
        .nest("/uploads", uploads::router())
        .nest("/posts", posts::protected_router())
        .nest("/categories", categories::protected_router())
        .nest("/pages", pages::protected_router())
        .nest("/menus", menus::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/schema", schema::router())
        .nest("/auth", auth::public_router())
        .nest("/posts", posts::public_router())
        .nest("/categories", categories::public_router())
        .nest("/pages", pages::public_router())
        .nest("/menus", menus::public_router())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ))
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS with credentials so browser clients can send the session cookie
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        // Uploaded files are served straight from disk
        .nest_service(
            state.files.public_prefix(),
            ServeDir::new(state.files.root()),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
