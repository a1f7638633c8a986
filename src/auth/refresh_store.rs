//! Refresh-token store, resolving spec.md §9's open question on refresh-token
//! persistence: kept in-process (the spec's Non-goals rule out durable
//! multi-node state) but as a real record rather than re-deriving claims from
//! the opaque string, shaped after the `OAuth2RefreshToken` record in
//! pierre_mcp_server's `oauth2/server.rs` (subject/client_id/scope/expiry/
//! revoked), guarded the same way as the teacher's `AuthorizationStore`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const REFRESH_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 30);

#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub subject: String,
    pub client_id: String,
    pub scope: String,
    expires_at: Instant,
    revoked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token revoked")]
    Revoked,
    #[error("refresh token expired")]
    Expired,
}

#[derive(Clone, Default)]
pub struct RefreshTokenStore {
    tokens: Arc<Mutex<HashMap<String, RefreshTokenRecord>>>,
}

impl RefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues and stores a new refresh token, returning its opaque value.
    pub async fn issue(&self, subject: &str, client_id: &str, scope: &str) -> String {
        let value = super::token::issue_refresh_value();
        let record = RefreshTokenRecord {
            subject: subject.to_string(),
            client_id: client_id.to_string(),
            scope: scope.to_string(),
            expires_at: Instant::now() + REFRESH_TOKEN_LIFETIME,
            revoked: false,
        };
        self.tokens.lock().await.insert(value.clone(), record);
        value
    }

    /// Looks up a refresh token without consuming it. Per spec.md §4.6,
    /// refresh tokens are reusable until explicitly revoked or expired —
    /// unlike authorization codes they are not single-use.
    pub async fn lookup(&self, value: &str) -> Result<RefreshTokenRecord, RefreshTokenError> {
        let tokens = self.tokens.lock().await;
        let record = tokens.get(value).ok_or(RefreshTokenError::NotFound)?;

        if record.revoked {
            return Err(RefreshTokenError::Revoked);
        }
        if Instant::now() >= record.expires_at {
            return Err(RefreshTokenError::Expired);
        }

        Ok(record.clone())
    }

    /// Revokes a single refresh token, e.g. on rotation at refresh-grant time.
    pub async fn revoke(&self, value: &str) {
        if let Some(record) = self.tokens.lock().await.get_mut(value) {
            record.revoked = true;
        }
    }

    pub async fn evict_expired(&self) {
        let now = Instant::now();
        self.tokens.lock().await.retain(|_, r| r.expires_at > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_round_trips_through_lookup() {
        let store = RefreshTokenStore::new();
        let value = store.issue("user-1", "client-1", "tasks:rw").await;

        let record = store.lookup(&value).await.unwrap();
        assert_eq!(record.subject, "user-1");
        assert_eq!(record.client_id, "client-1");
        assert_eq!(record.scope, "tasks:rw");
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let store = RefreshTokenStore::new();
        let value = store.issue("user-1", "client-1", "tasks:rw").await;
        store.revoke(&value).await;

        assert_eq!(store.lookup(&value).await.unwrap_err(), RefreshTokenError::Revoked);
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let store = RefreshTokenStore::new();
        assert_eq!(
            store.lookup("nonexistent").await.unwrap_err(),
            RefreshTokenError::NotFound
        );
    }

    #[tokio::test]
    async fn expired_token_is_rejected_even_if_not_revoked() {
        let store = RefreshTokenStore::new();
        let value = store.issue("user-1", "client-1", "tasks:rw").await;
        {
            let mut tokens = store.tokens.lock().await;
            tokens.get_mut(&value).unwrap().expires_at = Instant::now() - Duration::from_secs(1);
        }

        assert_eq!(store.lookup(&value).await.unwrap_err(), RefreshTokenError::Expired);
    }
}
