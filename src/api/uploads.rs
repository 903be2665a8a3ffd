//! Upload API endpoints
//!
//! Handles thumbnail uploads:
//! - POST /api/v1/uploads - Store a file, returning its public URL
//!
//! Accepts multipart/form-data with a single field named "file". The
//! stored name is generated server side; clients reference it in the
//! `thumbnail` field of posts.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::services::FileStoreError;

/// Build the uploads router (mounted behind the auth middleware)
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload_file))
}

/// POST /api/v1/uploads - Upload a file
async fn upload_file(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to read file: {}", e)))?;

        let stored = state
            .files
            .save(&filename, &content_type, &data)
            .await
            .map_err(|e| match e {
                FileStoreError::TypeNotAllowed(_) | FileStoreError::TooLarge { .. } => {
                    ApiError::validation_error(e.to_string())
                }
                FileStoreError::Io(_) => ApiError::internal_error(e.to_string()),
            })?;

        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(ApiError::validation_error("No file provided"))
}
