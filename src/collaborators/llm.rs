//! LLM collaborator: natural-language task parsing and subtask generation.
//! 30 s per-request timeout per spec.md §5. Optional — if no API key is
//! configured, calls fail with a `CollaboratorError` the caller surfaces
//! as a 500/-32000 rather than retrying (spec.md §7).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParsedTask {
    pub title: String,
    pub due_date: Option<String>,
    pub priority: Option<u8>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Subtask {
    pub title: String,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

impl LlmClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client should build with static TLS config"),
            base_url: DEFAULT_API_BASE.to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&CompletionRequest {
                model: "claude-3-5-haiku-20241022",
                max_tokens: 1024,
                messages: vec![Message { role: "user", content: prompt }],
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status { status, body });
        }

        let completion: CompletionResponse = response.json().await?;
        Ok(completion.content.into_iter().map(|b| b.text).collect())
    }

    /// `parse_task`: delegates free-form input to the LLM and expects a
    /// JSON object back matching `ParsedTask`.
    pub async fn parse_task(&self, input: &str) -> Result<ParsedTask, CollaboratorError> {
        let prompt = format!(
            "Extract a task title, an optional RFC 3339 due date, and an optional \
             priority (1-5) from this text. Respond with JSON only: {{\"title\":...,\
             \"due_date\":...,\"priority\":...}}\n\nText: {input}"
        );
        let raw = self.complete(&prompt).await?;
        serde_json::from_str(&raw).map_err(|e| CollaboratorError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: format!("LLM returned unparseable JSON: {e}"),
        })
    }

    /// `generate_subtasks`: breaks a task down into an ordered subtask list.
    pub async fn generate_subtasks(
        &self,
        task_title: &str,
        task_description: Option<&str>,
    ) -> Result<Vec<Subtask>, CollaboratorError> {
        let prompt = format!(
            "Break this task into 3-6 concrete subtasks. Respond with a JSON array \
             of objects each shaped {{\"title\":...}} only.\n\nTitle: {task_title}\n\
             Description: {}",
            task_description.unwrap_or("(none)")
        );
        let raw = self.complete(&prompt).await?;
        serde_json::from_str(&raw).map_err(|e| CollaboratorError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: format!("LLM returned unparseable JSON: {e}"),
        })
    }
}
