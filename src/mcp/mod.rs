//! MCP Dispatcher surface — C10. Mounted behind
//! `auth::middleware::mcp_auth_middleware`, per spec.md §4.9: every route
//! here requires a valid bearer token.

pub mod dispatcher;
pub mod tools;

use axum::{Router, middleware, routing::post};

use crate::auth::middleware::mcp_auth_middleware;
use crate::state::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/mcp/initialize", post(dispatcher::initialize_handler))
        .route("/mcp/list_tools", post(dispatcher::list_tools_handler))
        .route("/mcp/call_tool", post(dispatcher::call_tool_handler))
        .layer(middleware::from_fn_with_state(state, mcp_auth_middleware))
}
