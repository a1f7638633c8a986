//! Authorization Endpoint — C5.
//!
//! The OAuth 2.1 request validator and redirect-or-JSON error dispatcher,
//! grounded in the teacher's `authorize_handler` (`auth/authorization_code.rs`)
//! but driven as an explicit ordered state machine per spec.md §4.5 rather
//! than the teacher's consent-page detour (the teacher pauses for a user
//! click; this spec assumes an already-authenticated subject, see
//! SPEC_FULL.md §9).

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::AuthState;
use crate::auth::code_store::AuthorizationCodeRecord;
use crate::auth::pkce::CodeChallengeMethod;
use crate::error::{OAuthError, OAuthErrorKind};

const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "claude"];

#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub response_type: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    error_description: String,
}

/// Chooses between a JSON 400 body and a redirect to the caller's
/// `redirect_uri`, carrying the OAuth error as query parameters. This
/// distinction is the open-redirect defense spec.md §4.5 requires: a target
/// is only trusted once it has passed the absolute-URI + allowlisted-scheme
/// checks (and, for unknown-client errors, the registry's own allowlist).
enum Outcome {
    Redirect(Url),
    Json,
}

fn error_response(outcome: Outcome, kind: OAuthErrorKind, description: &str, state: Option<&str>) -> Response {
    match outcome {
        Outcome::Json => OAuthError::new(kind, description).into_response(),
        Outcome::Redirect(mut target) => {
            {
                let mut pairs = target.query_pairs_mut();
                pairs.append_pair("error", &kind.to_string());
                pairs.append_pair("error_description", description);
                if let Some(state) = state {
                    if !state.is_empty() {
                        pairs.append_pair("state", state);
                    }
                }
            }
            (StatusCode::FOUND, Redirect::to(target.as_str())).into_response()
        }
    }
}

/// Parses and validates `redirect_uri` per step 3: absolute, with an
/// allowlisted scheme. A failure here means the caller gets JSON, never a
/// redirect — there is nothing safe to redirect to.
fn parse_redirect_target(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    if ALLOWED_SCHEMES.contains(&url.scheme()) {
        Some(url)
    } else {
        None
    }
}

pub async fn authorize_handler(
    State(state): State<AuthState>,
    headers: HeaderMap,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    // Step 1: client_id is mandatory. Whether the failure redirects depends
    // on whether we already have a trustworthy redirect_uri.
    let Some(client_id) = params.client_id.as_deref().filter(|s| !s.is_empty()) else {
        let outcome = params
            .redirect_uri
            .as_deref()
            .and_then(parse_redirect_target)
            .map(Outcome::Redirect)
            .unwrap_or(Outcome::Json);
        return error_response(
            outcome,
            OAuthErrorKind::InvalidRequest,
            "client_id is required",
            params.state.as_deref(),
        );
    };

    // Step 2: redirect_uri is mandatory outright.
    let Some(redirect_uri_raw) = params.redirect_uri.as_deref().filter(|s| !s.is_empty()) else {
        return OAuthError::new(OAuthErrorKind::InvalidRequest, "redirect_uri is required").into_response();
    };

    // Step 3: redirect_uri must be absolute with an allowed scheme. This is
    // the security boundary: failure here is always JSON.
    let Some(redirect_target) = parse_redirect_target(redirect_uri_raw) else {
        return OAuthError::new(
            OAuthErrorKind::InvalidRequest,
            "redirect_uri must be absolute with scheme http, https, or claude",
        )
        .into_response();
    };

    // Step 4: response_type must be "code".
    if params.response_type.as_deref() != Some("code") {
        return error_response(
            Outcome::Redirect(redirect_target),
            OAuthErrorKind::UnsupportedResponseType,
            "only response_type=code is supported",
            params.state.as_deref(),
        );
    }

    // Step 5: state is mandatory for CSRF protection.
    let Some(request_state) = params.state.as_deref().filter(|s| !s.is_empty()) else {
        return error_response(
            Outcome::Redirect(redirect_target),
            OAuthErrorKind::InvalidRequest,
            "state required for CSRF protection",
            None,
        );
    };

    // Step 6: the client must be registered.
    let Some(client) = state.clients.lookup(client_id).await else {
        return error_response(
            Outcome::Redirect(redirect_target),
            OAuthErrorKind::InvalidClient,
            "unknown client_id",
            Some(request_state),
        );
    };

    // Step 7: redirect_uri must be on the client's allowlist. Failure here
    // never redirects — the URI itself is what's untrusted.
    if !client.allowed_redirects.contains(redirect_uri_raw) {
        return OAuthError::new(
            OAuthErrorKind::InvalidRequest,
            "redirect_uri is not registered for this client",
        )
        .into_response();
    }

    // Step 8: PKCE challenge validation, if present.
    let code_challenge = params.code_challenge.clone().unwrap_or_default();
    let code_challenge_method = if code_challenge.is_empty() {
        CodeChallengeMethod::None
    } else {
        let method_raw = params.code_challenge_method.as_deref().unwrap_or("S256");
        let Some(method) = CodeChallengeMethod::parse(method_raw) else {
            return error_response(
                Outcome::Redirect(redirect_target),
                OAuthErrorKind::InvalidRequest,
                "unsupported code_challenge_method",
                Some(request_state),
            );
        };
        if method == CodeChallengeMethod::S256 && !(43..=128).contains(&code_challenge.len()) {
            return error_response(
                Outcome::Redirect(redirect_target),
                OAuthErrorKind::InvalidRequest,
                "code_challenge length must be between 43 and 128 characters",
                Some(request_state),
            );
        }
        method
    };

    // Step 9: mint and store the authorization code.
    let subject = headers
        .get("x-subject")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.dev_subject.clone());

    let scope = params.scope.clone().unwrap_or_default();
    let code = crate::auth::token::issue_refresh_value();
    let record = AuthorizationCodeRecord::new(
        client.id.clone(),
        redirect_uri_raw.to_string(),
        code_challenge,
        code_challenge_method,
        scope.clone(),
        request_state.to_string(),
        subject,
    );
    state.codes.store(code.clone(), record).await;

    // Step 10: redirect with code, state, and (if requested) scope.
    let mut target = redirect_target;
    {
        let mut pairs = target.query_pairs_mut();
        pairs.append_pair("code", &code);
        pairs.append_pair("state", request_state);
        if !scope.is_empty() {
            pairs.append_pair("scope", &scope);
        }
    }
    (StatusCode::FOUND, Redirect::to(target.as_str())).into_response()
}

pub type AuthorizeQuery = HashMap<String, String>;
