//! Liveness and readiness endpoints, per spec.md §6.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;

use crate::state::AppState;

pub async fn liveness(State(state): State<AppState>) -> Response {
    let body = json!({
        "status": "ok",
        "service": "mcp-productivity-gateway",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "supabase": state.document_store_configured(),
            "claude": state.llm.is_some(),
        },
    });
    (StatusCode::OK, Json(body)).into_response()
}

/// 200 iff the required collaborator environment is configured, else 503.
pub async fn readiness(State(state): State<AppState>) -> Response {
    if state.document_store_configured() {
        (StatusCode::OK, Json(json!({ "ready": true }))).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "ready": false }))).into_response()
    }
}
