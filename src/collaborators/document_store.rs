//! Document-store collaborator: persists tasks and goals via a REST-over-
//! HTTPS API (the deployment's configured document store), per spec.md
//! §1's "external collaborators" boundary. 15 s per-request timeout per
//! spec.md §5.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct DocumentStoreClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub due_date: String,
    pub priority: u8,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTask<'a> {
    pub title: &'a str,
    pub due_date: &'a str,
    pub priority: u8,
    pub user_id: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub start_date: String,
    pub target_date: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGoal<'a> {
    pub title: &'a str,
    pub start_date: &'a str,
    pub target_date: &'a str,
    pub user_id: &'a str,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductivitySummary {
    pub user_id: String,
    pub days: u32,
    pub tasks_completed: u64,
    pub tasks_overdue: u64,
}

impl DocumentStoreClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client should build with static TLS config"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CollaboratorError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(CollaboratorError::Status { status, body })
        }
    }

    pub async fn create_task(&self, task: &NewTask<'_>) -> Result<Task, CollaboratorError> {
        let response = self
            .client
            .post(self.url("tasks"))
            .bearer_auth(&self.api_key)
            .json(task)
            .send()
            .await?;
        Ok(Self::check_status(response).await?.json().await?)
    }

    pub async fn create_goal(&self, goal: &NewGoal<'_>) -> Result<Goal, CollaboratorError> {
        let response = self
            .client
            .post(self.url("goals"))
            .bearer_auth(&self.api_key)
            .json(goal)
            .send()
            .await?;
        Ok(Self::check_status(response).await?.json().await?)
    }

    pub async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, CollaboratorError> {
        let response = self
            .client
            .get(self.url("tasks"))
            .bearer_auth(&self.api_key)
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        Ok(Self::check_status(response).await?.json().await?)
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, CollaboratorError> {
        let response = self
            .client
            .get(self.url(&format!("tasks/{id}")))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Ok(Self::check_status(response).await?.json().await?)
    }

    pub async fn analyze_productivity(
        &self,
        user_id: &str,
        days: u32,
    ) -> Result<ProductivitySummary, CollaboratorError> {
        let response = self
            .client
            .get(self.url("analytics/productivity"))
            .bearer_auth(&self.api_key)
            .query(&[("user_id", user_id), ("days", &days.to_string())])
            .send()
            .await?;
        Ok(Self::check_status(response).await?.json().await?)
    }
}
