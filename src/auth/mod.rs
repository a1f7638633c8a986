//! OAuth 2.1 authorization server: C1-C7 and C9, wired together behind a
//! single `AuthState` bundle passed to axum route handlers by dependency
//! injection, per SPEC_FULL.md §9's "shared registries as process-global
//! state" design note — no ambient singletons.

pub mod authorize;
pub mod client_registry;
pub mod code_store;
pub mod discovery;
pub mod middleware;
pub mod pkce;
pub mod refresh_store;
pub mod token;
pub mod token_endpoint;

use axum::{
    Router,
    routing::{get, post},
};

use client_registry::ClientRegistry;
use code_store::AuthorizationCodeStore;
use refresh_store::RefreshTokenStore;
use token::TokenService;

/// The bundle every OAuth and MCP-auth handler is invoked with.
#[derive(Clone)]
pub struct AuthState {
    pub clients: ClientRegistry,
    pub codes: AuthorizationCodeStore,
    pub refresh_tokens: RefreshTokenStore,
    pub tokens: TokenService,
    pub public_origin: String,
    pub dev_subject: String,
}

impl AuthState {
    pub async fn new(signing_secret: &str, public_origin: String, dev_subject: String) -> Self {
        Self {
            clients: ClientRegistry::with_defaults(&public_origin).await,
            codes: AuthorizationCodeStore::new(),
            refresh_tokens: RefreshTokenStore::new(),
            tokens: TokenService::new(signing_secret),
            public_origin,
            dev_subject,
        }
    }
}

/// Mounts the OAuth surface spec.md §6 lists: discovery, authorize, token,
/// introspect, register. Generic over `crate::state::AppState` (via
/// `FromRef`) so it can be merged into the same router as the REST and MCP
/// surfaces. `/mcp/*` routes are mounted separately by `crate::mcp`,
/// guarded by `middleware::mcp_auth_middleware`.
pub fn routes() -> Router<crate::state::AppState> {
    Router::new()
        .route(
            "/.well-known/oauth-authorization-server",
            get(discovery::metadata_handler),
        )
        .route("/authorize", get(authorize::authorize_handler))
        .route("/oauth/authorize", get(authorize::authorize_handler))
        .route("/oauth/token", post(token_endpoint::token_handler))
        .route("/oauth/introspect", post(discovery::introspect_handler))
        .route("/oauth/register", post(discovery::register_handler))
}
