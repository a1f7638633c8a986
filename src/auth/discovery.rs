//! Discovery + Introspection + Registration — C7.
//!
//! Grounded in the teacher's `metadata_handler`/`register_handler`
//! (`auth/handlers.rs`), generalized to the full RFC 8414 shape spec.md
//! §4.7 names and adding the introspection endpoint the teacher lacks.

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthState;
use crate::auth::client_registry::ClientSpec;

#[derive(Debug, Serialize)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub revocation_endpoint: String,
    pub token_endpoint_auth_methods_supported: Vec<&'static str>,
    pub response_types_supported: Vec<&'static str>,
    pub grant_types_supported: Vec<&'static str>,
    pub code_challenge_methods_supported: Vec<&'static str>,
    pub scopes_supported: Vec<String>,
    pub response_modes_supported: Vec<&'static str>,
}

/// `GET /.well-known/oauth-authorization-server`. The issuer and endpoint
/// URLs are computed from `AuthState::public_origin`, which already resolved
/// the forwarded-header-trust question at request time (see C9/bootstrap).
pub async fn metadata_handler(State(state): State<AuthState>) -> Response {
    let origin = &state.public_origin;
    let metadata = AuthorizationServerMetadata {
        issuer: origin.clone(),
        authorization_endpoint: format!("{origin}/authorize"),
        token_endpoint: format!("{origin}/oauth/token"),
        revocation_endpoint: format!("{origin}/oauth/revoke"),
        token_endpoint_auth_methods_supported: vec!["client_secret_post", "client_secret_basic", "none"],
        response_types_supported: vec!["code"],
        grant_types_supported: vec!["authorization_code", "refresh_token"],
        code_challenge_methods_supported: vec!["S256", "plain"],
        scopes_supported: vec!["tasks:read".to_string(), "tasks:write".to_string(), "goals:write".to_string()],
        response_modes_supported: vec!["query"],
    };
    Json(metadata).into_response()
}

#[derive(Debug, Deserialize)]
pub struct IntrospectRequest {
    pub token: String,
}

/// RFC 7662 introspection conventionally sends
/// `application/x-www-form-urlencoded`; spec.md §4.7 also allows JSON.
/// Dispatches on the request's `Content-Type` so either body shape is
/// accepted at the same route.
pub struct IntrospectPayload(pub IntrospectRequest);

impl<S> FromRequest<S> for IntrospectPayload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(payload) = Form::<IntrospectRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(IntrospectPayload(payload))
        } else {
            let Json(payload) = Json::<IntrospectRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(IntrospectPayload(payload))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IntrospectResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// `POST /oauth/introspect`. Never echoes signature details — an invalid
/// token just yields `{active:false}`, matching spec.md §4.7.
pub async fn introspect_handler(State(state): State<AuthState>, IntrospectPayload(req): IntrospectPayload) -> Response {
    match state.tokens.validate_access(&req.token) {
        Ok(claims) => Json(IntrospectResponse {
            active: true,
            client_id: Some(claims.client_id),
            scope: Some(claims.scope),
            exp: Some(claims.exp),
            iat: Some(claims.iat),
        })
        .into_response(),
        Err(_) => Json(IntrospectResponse {
            active: false,
            client_id: None,
            scope: None,
            exp: None,
            iat: None,
        })
        .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ClientRegistrationRequest {
    pub client_name: Option<String>,
    pub redirect_uris: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ClientRegistrationResponse {
    pub client_id: String,
    pub client_secret: String,
    pub client_id_issued_at: i64,
    pub redirect_uris: Vec<String>,
}

/// `POST /oauth/register` (RFC 7591). Registrations do not survive a
/// restart, per spec.md §1's Non-goals.
pub async fn register_handler(State(state): State<AuthState>, Json(req): Json<ClientRegistrationRequest>) -> Response {
    let client_id = format!("mcp-client-{}", Uuid::new_v4());
    let client_secret = Uuid::new_v4().to_string();
    let redirect_uris = req.redirect_uris.unwrap_or_default();

    state
        .clients
        .register(ClientSpec {
            id: client_id.clone(),
            secret: Some(client_secret.clone()),
            allowed_redirects: redirect_uris.clone(),
            display_name: req.client_name.unwrap_or_else(|| client_id.clone()),
        })
        .await;

    (
        StatusCode::CREATED,
        Json(ClientRegistrationResponse {
            client_id,
            client_secret,
            client_id_issued_at: chrono::Utc::now().timestamp(),
            redirect_uris,
        }),
    )
        .into_response()
}
