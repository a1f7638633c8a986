//! Token Endpoint — C6.
//!
//! Grant-type router for `authorization_code` and `refresh_token`, grounded
//! in the teacher's `oauth_token_handler` (`auth/handlers.rs`) but narrowed
//! to the two grant types this spec names — the teacher's `client_credentials`
//! path has no counterpart here (see DESIGN.md for the drop).

use axum::{Json, extract::State, response::IntoResponse, response::Response};
use serde::{Deserialize, Serialize};

use crate::auth::AuthState;
use crate::auth::code_store::CodeError;
use crate::auth::pkce;
use crate::error::{OAuthError, OAuthErrorKind};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub code: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub code_verifier: Option<String>,
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

pub async fn token_handler(State(state): State<AuthState>, Json(req): Json<TokenRequest>) -> Response {
    match req.grant_type.as_str() {
        "authorization_code" => authorization_code_grant(&state, req).await,
        "refresh_token" => refresh_token_grant(&state, req).await,
        _ => OAuthError::new(OAuthErrorKind::UnsupportedGrantType, "unsupported grant_type").into_response(),
    }
}

async fn authorization_code_grant(state: &AuthState, req: TokenRequest) -> Response {
    let Some(code) = req.code.as_deref().filter(|c| !c.is_empty()) else {
        return OAuthError::new(OAuthErrorKind::InvalidRequest, "code is required").into_response();
    };

    if let Some(client_id) = req.client_id.as_deref() {
        let secret = req.client_secret.as_deref().unwrap_or("");
        if !state.clients.validate(client_id, secret).await {
            return OAuthError::new(OAuthErrorKind::InvalidClient, "client authentication failed").into_response();
        }
    }

    let record = match state.codes.consume(code).await {
        Ok(record) => record,
        Err(CodeError::NotFound | CodeError::AlreadyUsed) => {
            return OAuthError::new(OAuthErrorKind::InvalidGrant, "authorization code is invalid or already used")
                .into_response();
        }
        Err(CodeError::Expired) => {
            return OAuthError::new(OAuthErrorKind::InvalidGrant, "authorization code has expired").into_response();
        }
    };

    if let Some(requested_redirect) = req.redirect_uri.as_deref() {
        if requested_redirect != record.redirect_uri {
            return OAuthError::new(OAuthErrorKind::InvalidGrant, "redirect_uri does not match the authorization request")
                .into_response();
        }
    }

    if !record.code_challenge.is_empty() {
        if let Err(_e) =
            pkce::validate(&record.code_challenge, record.code_challenge_method, req.code_verifier.as_deref())
        {
            return OAuthError::new(OAuthErrorKind::InvalidGrant, "PKCE verification failed").into_response();
        }
    }

    let Ok(access_token) = state.tokens.issue_access(&record.subject, &record.client_id, &record.scope) else {
        return OAuthError::new(OAuthErrorKind::ServerError, "failed to issue access token").into_response();
    };
    let refresh_token = state
        .refresh_tokens
        .issue(&record.subject, &record.client_id, &record.scope)
        .await;

    Json(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: crate::auth::token::ACCESS_TOKEN_LIFETIME_SECS,
        refresh_token: Some(refresh_token),
        scope: (!record.scope.is_empty()).then_some(record.scope),
    })
    .into_response()
}

async fn refresh_token_grant(state: &AuthState, req: TokenRequest) -> Response {
    let Some(refresh_token) = req.refresh_token.as_deref().filter(|t| !t.is_empty()) else {
        return OAuthError::new(OAuthErrorKind::InvalidRequest, "refresh_token is required").into_response();
    };

    let record = match state.refresh_tokens.lookup(refresh_token).await {
        Ok(record) => record,
        Err(_) => {
            return OAuthError::new(OAuthErrorKind::InvalidGrant, "refresh_token is invalid, revoked, or expired")
                .into_response();
        }
    };

    let Ok(access_token) = state.tokens.issue_access(&record.subject, &record.client_id, &record.scope) else {
        return OAuthError::new(OAuthErrorKind::ServerError, "failed to issue access token").into_response();
    };

    // Rotate: revoke the presented refresh token and issue a fresh one.
    state.refresh_tokens.revoke(refresh_token).await;
    let new_refresh = state
        .refresh_tokens
        .issue(&record.subject, &record.client_id, &record.scope)
        .await;

    Json(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: crate::auth::token::ACCESS_TOKEN_LIFETIME_SECS,
        refresh_token: Some(new_refresh),
        scope: (!record.scope.is_empty()).then_some(record.scope),
    })
    .into_response()
}
