//! Token Service — C4.
//!
//! Issues and validates signed bearer tokens, grounded in the teacher's
//! `JwtTokenIssuer`/`JwtTokenValidator` (`auth/token.rs`), generalized to
//! carry `client_id` and `scope` claims per spec.md §3/§6 and pinned to a
//! fixed 3,600s lifetime rather than the teacher's configurable one.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub client_id: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum TokenError {
    #[error("token signature or claims invalid")]
    Invalid,
    #[error("token expired")]
    Expired,
}

/// Loads the signing secret per spec.md §4.4: mandatory in production,
/// randomly generated and logged as a warning in development.
pub fn load_signing_secret(configured: Option<&str>, is_production: bool) -> anyhow::Result<String> {
    if let Some(secret) = configured {
        return Ok(secret.to_string());
    }
    if is_production {
        anyhow::bail!("JWT_SECRET is required in production mode");
    }

    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let secret = URL_SAFE_NO_PAD.encode(bytes);
    tracing::warn!(
        "No JWT_SECRET configured; generated an ephemeral development secret. \
         Tokens will not validate across restarts."
    );
    Ok(secret)
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims = ["sub", "exp", "iat"].into_iter().map(String::from).collect();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// `issueAccess(subject, clientId, scope) -> string`.
    pub fn issue_access(&self, subject: &str, client_id: &str, scope: &str) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            client_id: client_id.to_string(),
            scope: scope.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ACCESS_TOKEN_LIFETIME_SECS)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("failed to sign access token: {e}"))
    }

    /// `validateAccess(string) -> claims | invalid`. The `Validation`
    /// pins the algorithm to HS256, so a token whose header declares a
    /// different algorithm (including `none`) is rejected before signature
    /// verification is even attempted.
    pub fn validate_access(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// `issueRefresh() -> string`: opaque 256-bit random, URL-safe base64.
pub fn issue_refresh_value() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_claims_and_lifetime() {
        let service = TokenService::new("test-secret");
        let token = service.issue_access("user-1", "client-1", "tasks:rw").unwrap();
        let claims = service.validate_access(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.client_id, "client-1");
        assert_eq!(claims.scope, "tasks:rw");
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = TokenService::new("secret-a");
        let verifier = TokenService::new("secret-b");
        let token = issuer.issue_access("user-1", "client-1", "scope").unwrap();
        assert!(matches!(
            verifier.validate_access(&token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn alg_none_token_is_rejected() {
        // Hand-construct a JWT with alg=none to confirm the algorithm pin
        // rejects it rather than trusting the header.
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = Claims {
            sub: "user-1".into(),
            client_id: "client-1".into(),
            scope: "scope".into(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 3600,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let forged = format!("{header}.{payload}.");

        let service = TokenService::new("test-secret");
        assert!(matches!(
            service.validate_access(&forged),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn issued_refresh_tokens_are_unique_and_url_safe() {
        let a = issue_refresh_value();
        let b = issue_refresh_value();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
