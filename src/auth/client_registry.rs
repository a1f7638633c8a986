//! Client Registry — C2.
//!
//! In-memory id -> client mapping, guarded by a single `RwLock` as the
//! teacher's `ClientRegistry` (`auth/authorization_code.rs`) guards its
//! redirect-uri map. Generalized here from "redirect URIs only" to the
//! full `Client` record spec.md §3 defines.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct Client {
    pub id: String,
    pub secret: Option<String>,
    pub allowed_redirects: HashSet<String>,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct ClientSpec {
    pub id: String,
    pub secret: Option<String>,
    pub allowed_redirects: Vec<String>,
    pub display_name: String,
}

#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<String, Client>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry seeded with the two default clients spec.md §4.2
    /// calls for: one for the desktop agent, one generic client.
    pub async fn with_defaults(hosted_origin: &str) -> Self {
        let registry = Self::new();

        registry
            .register(ClientSpec {
                id: "claude-desktop".to_string(),
                secret: None,
                allowed_redirects: vec![
                    "http://localhost".to_string(),
                    format!("{hosted_origin}/api/mcp/auth_callback"),
                    "claude://oauth-callback".to_string(),
                ],
                display_name: "Claude Desktop".to_string(),
            })
            .await;

        registry
            .register(ClientSpec {
                id: "mcp-generic-client".to_string(),
                secret: None,
                allowed_redirects: vec![
                    "http://localhost".to_string(),
                    format!("{hosted_origin}/oauth/callback"),
                    "claude://oauth-callback".to_string(),
                ],
                display_name: "Generic MCP Client".to_string(),
            })
            .await;

        registry
    }

    pub async fn lookup(&self, id: &str) -> Option<Client> {
        self.clients.read().await.get(id).cloned()
    }

    /// Empty secret is permitted for public/PKCE clients: succeeds iff the
    /// client has no secret set, or the secrets match in constant time.
    pub async fn validate(&self, id: &str, secret: &str) -> bool {
        let Some(client) = self.lookup(id).await else {
            return false;
        };
        match &client.secret {
            None => true,
            Some(expected) => expected.as_bytes().ct_eq(secret.as_bytes()).into(),
        }
    }

    /// Exact string match against the client's allowlist.
    pub async fn redirect_allowed(&self, id: &str, uri: &str) -> bool {
        let Some(client) = self.lookup(id).await else {
            return false;
        };
        client.allowed_redirects.contains(uri)
    }

    /// Idempotent by id: last write wins.
    pub async fn register(&self, spec: ClientSpec) -> Client {
        let client = Client {
            id: spec.id.clone(),
            secret: spec.secret,
            allowed_redirects: spec.allowed_redirects.into_iter().collect(),
            display_name: spec.display_name,
        };
        self.clients
            .write()
            .await
            .insert(client.id.clone(), client.clone());
        client
    }
}
