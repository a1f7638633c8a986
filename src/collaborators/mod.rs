//! Collaborator Clients — C11.
//!
//! Thin HTTP wrappers around the two external systems this server treats
//! as opaque collaborators per spec.md §1: a REST-over-HTTPS document
//! store for tasks/goals, and an LLM API for natural-language parsing.
//! Both are modeled in the style of the teacher's `CouchDbClient`
//! (`couchdb.rs`): a `reqwest::Client`, a base URL, and methods that map
//! non-2xx responses to a `CollaboratorError`.

pub mod document_store;
pub mod llm;

pub use document_store::DocumentStoreClient;
pub use llm::LlmClient;
