use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The OAuth 2.1 error codes this server emits, per the error taxonomy in
/// the specification (§7). `Display` yields the wire `error` value exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OAuthErrorKind {
    #[error("invalid_request")]
    InvalidRequest,
    #[error("invalid_client")]
    InvalidClient,
    #[error("unauthorized_client")]
    UnauthorizedClient,
    #[error("unsupported_response_type")]
    UnsupportedResponseType,
    #[error("invalid_scope")]
    InvalidScope,
    #[error("invalid_grant")]
    InvalidGrant,
    #[error("unsupported_grant_type")]
    UnsupportedGrantType,
    #[error("server_error")]
    ServerError,
}

/// An OAuth error paired with a human description, ready to be rendered
/// either as a JSON body or as redirect query parameters.
#[derive(Debug, Clone)]
pub struct OAuthError {
    pub kind: OAuthErrorKind,
    pub description: String,
}

impl OAuthError {
    pub fn new(kind: OAuthErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            OAuthErrorKind::InvalidClient | OAuthErrorKind::UnauthorizedClient => {
                StatusCode::UNAUTHORIZED
            }
            OAuthErrorKind::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Serialize)]
struct OAuthErrorBody {
    error: String,
    error_description: String,
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = OAuthErrorBody {
            error: self.kind.to_string(),
            error_description: self.description,
        };
        (status, Json(body)).into_response()
    }
}

/// JSON-RPC protocol / dispatch errors, carrying the codes the spec pins
/// down explicitly: -32700 parse, -32601 unknown method, -32001 auth.
/// -32602 (invalid params) follows JSON-RPC 2.0 itself for malformed or
/// missing tool arguments, which the spec's error table doesn't itemize.
#[derive(Debug, Clone, Copy)]
pub enum DispatchErrorCode {
    ParseError,
    InvalidParams,
    UnknownMethod,
    Unauthorized,
    CollaboratorFailure,
}

impl DispatchErrorCode {
    pub fn code(self) -> i64 {
        match self {
            DispatchErrorCode::ParseError => -32700,
            DispatchErrorCode::InvalidParams => -32602,
            DispatchErrorCode::UnknownMethod => -32601,
            DispatchErrorCode::Unauthorized => -32001,
            DispatchErrorCode::CollaboratorFailure => -32000,
        }
    }
}

#[derive(Debug)]
pub struct DispatchError {
    pub code: DispatchErrorCode,
    pub message: String,
}

impl DispatchError {
    pub fn new(code: DispatchErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unknown_method(method: &str) -> Self {
        Self::new(
            DispatchErrorCode::UnknownMethod,
            format!("Unknown method: {method}"),
        )
    }
}

/// Errors surfaced by the external document-store / LLM collaborators.
/// The core never retries these; they propagate to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("collaborator returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl From<CollaboratorError> for DispatchError {
    fn from(value: CollaboratorError) -> Self {
        DispatchError::new(DispatchErrorCode::CollaboratorFailure, value.to_string())
    }
}

/// Top-level error type for plain REST handlers (`/api/tasks`, `/api/goals`).
/// Collaborator failures surface as 500s per spec.md §7; the core does not
/// retry or reinterpret them.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<CollaboratorError> for ApiError {
    fn from(value: CollaboratorError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: value.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct Body {
            error: String,
        }
        (self.status, Json(Body { error: self.message })).into_response()
    }
}
