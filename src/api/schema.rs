//! Schema introspection endpoint
//!
//! - GET /api/v1/schema - Describe the configured entities and policies
//!
//! Lets clients discover field shapes and access rules without prior
//! knowledge of the deployment. Read only; the registry is immutable
//! after startup.

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::AppState;

/// Build the schema router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_schema))
}

/// GET /api/v1/schema - Entity descriptors and the policy table
async fn get_schema(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "entities": state.registry.entities(),
        "policies": state.policies.rows(),
    }))
}
