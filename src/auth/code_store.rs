//! Authorization-Code Store — C3.
//!
//! Single-process, mutex-guarded map with the single-use invariant spec.md
//! §3 requires. Grounded in the teacher's `AuthorizationStore`
//! (`auth/authorization_code.rs`), generalized from "temp code -> pending
//! consent" to the full authorization-code record and the three-way
//! `NotFound | AlreadyUsed | Expired` distinction the teacher didn't need.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::auth::pkce::CodeChallengeMethod;

pub const CODE_LIFETIME: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct AuthorizationCodeRecord {
    pub client_id: String,
    pub redirect_uri: String,
    pub code_challenge: String,
    pub code_challenge_method: CodeChallengeMethod,
    pub scope: String,
    pub state: String,
    pub subject: String,
    expires_at: Instant,
    used: bool,
}

impl AuthorizationCodeRecord {
    pub fn new(
        client_id: String,
        redirect_uri: String,
        code_challenge: String,
        code_challenge_method: CodeChallengeMethod,
        scope: String,
        state: String,
        subject: String,
    ) -> Self {
        Self {
            client_id,
            redirect_uri,
            code_challenge,
            code_challenge_method,
            scope,
            state,
            subject,
            expires_at: Instant::now() + CODE_LIFETIME,
            used: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    #[error("authorization code not found")]
    NotFound,
    #[error("authorization code already used")]
    AlreadyUsed,
    #[error("authorization code expired")]
    Expired,
}

#[derive(Clone, Default)]
pub struct AuthorizationCodeStore {
    codes: Arc<Mutex<HashMap<String, AuthorizationCodeRecord>>>,
}

impl AuthorizationCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic insert.
    pub async fn store(&self, code: String, record: AuthorizationCodeRecord) {
        self.codes.lock().await.insert(code, record);
    }

    /// Atomic lookup + mark-used. `used` transitions false->true and never
    /// back; a second consume of the same code always fails with
    /// `AlreadyUsed`, never silently re-succeeds.
    pub async fn consume(&self, code: &str) -> Result<AuthorizationCodeRecord, CodeError> {
        let mut codes = self.codes.lock().await;
        let record = codes.get_mut(code).ok_or(CodeError::NotFound)?;

        if record.used {
            return Err(CodeError::AlreadyUsed);
        }
        if Instant::now() >= record.expires_at {
            return Err(CodeError::Expired);
        }

        record.used = true;
        Ok(record.clone())
    }

    /// Advisory cleanup of expired entries; `consume` remains the
    /// authoritative check regardless of whether this has run.
    pub async fn evict_expired(&self) {
        let now = Instant::now();
        self.codes.lock().await.retain(|_, r| r.expires_at > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> AuthorizationCodeRecord {
        AuthorizationCodeRecord::new(
            "client-1".into(),
            "https://example.com/cb".into(),
            String::new(),
            CodeChallengeMethod::None,
            "tasks:write".into(),
            "state-123".into(),
            "dev-user".into(),
        )
    }

    #[tokio::test]
    async fn single_use_code_fails_on_replay() {
        let store = AuthorizationCodeStore::new();
        store.store("code-1".into(), sample_record()).await;

        assert!(store.consume("code-1").await.is_ok());
        let err = store.consume("code-1").await.unwrap_err();
        assert_eq!(err, CodeError::AlreadyUsed);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let store = AuthorizationCodeStore::new();
        assert_eq!(
            store.consume("nonexistent").await.unwrap_err(),
            CodeError::NotFound
        );
    }

    #[tokio::test]
    async fn expired_code_fails_even_if_unused() {
        let store = AuthorizationCodeStore::new();
        let mut record = sample_record();
        record.expires_at = Instant::now() - Duration::from_secs(1);
        store.store("code-2".into(), record).await;

        assert_eq!(
            store.consume("code-2").await.unwrap_err(),
            CodeError::Expired
        );
    }
}
