//! The single state bundle every handler in the crate is invoked with.
//! Submodules needing only a slice of it (the OAuth handlers need
//! `AuthState`; MCP dispatch needs the collaborators) extract that slice
//! via `FromRef`, per SPEC_FULL.md §9's dependency-injection note — no
//! ambient singletons, one bundle constructed at startup and threaded
//! through route registration.

use axum::extract::FromRef;

use crate::auth::AuthState;
use crate::collaborators::{DocumentStoreClient, LlmClient};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub document_store: DocumentStoreClient,
    pub llm: Option<LlmClient>,
    document_store_configured: bool,
}

impl AppState {
    pub fn new(
        auth: AuthState,
        document_store: DocumentStoreClient,
        llm: Option<LlmClient>,
        document_store_configured: bool,
    ) -> Self {
        Self { auth, document_store, llm, document_store_configured }
    }

    pub fn document_store_configured(&self) -> bool {
        self.document_store_configured
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
