//! Authentication Middleware — C9.
//!
//! Grounded in the teacher's `jwt_auth_middleware` (`auth/middleware.rs`),
//! but emitting the JSON-RPC error envelope spec.md §4.9 requires instead
//! of a bare 401 — the MCP surface is JSON-RPC end to end, including its
//! auth failures.

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::auth::AuthState;

/// The identifier attached to request extensions on success; handlers pull
/// this out instead of re-validating the token.
#[derive(Debug, Clone)]
pub struct AuthenticatedSubject(pub String);

pub async fn mcp_auth_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let header_value = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let token = match header_value.as_deref() {
        Some(header) if header.len() > 7 && header.starts_with("Bearer ") => &header[7..],
        _ => return unauthorized("Unauthorized: missing or malformed Authorization header"),
    };

    if token.is_empty() {
        return unauthorized("Unauthorized: empty bearer token");
    }

    match state.tokens.validate_access(token) {
        Ok(claims) => {
            req.extensions_mut().insert(AuthenticatedSubject(claims.sub));
            next.run(req).await
        }
        Err(e) => unauthorized(&format!("Unauthorized: {e}")),
    }
}

fn unauthorized(message: &str) -> Response {
    let body = json!({
        "jsonrpc": "2.0",
        "id": null,
        "error": { "code": -32001, "message": message },
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
