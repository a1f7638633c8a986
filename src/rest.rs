//! REST operations for `/api/tasks`, `/api/goals`, and the LLM-backed
//! operations — the single validation/logging code path the MCP
//! Dispatcher (C10) re-enters directly, per spec.md §4.10's re-entry
//! rationale: "the MCP surface and the REST surface implement the same
//! operations; re-entry preserves one code path."
//!
//! Each operation below is a plain `async fn(&AppState, Req) -> Result<Resp,
//! ApiError>` — the canonical REST request/response pair spec.md §9
//! describes. axum route handlers and `crate::mcp::dispatcher` both call
//! these directly in-process, rather than synthesizing and replaying real
//! HTTP requests.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
    routing::post,
};
use serde::{Deserialize, Serialize};

use crate::collaborators::document_store::{Goal, NewGoal, NewTask, ProductivitySummary, Task};
use crate::collaborators::llm::{ParsedTask, Subtask};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub due_date: String,
    pub priority: Option<u8>,
    pub user_id: Option<String>,
}

pub async fn create_task(state: &AppState, req: CreateTaskRequest, user_id_fallback: &str) -> Result<Task, ApiError> {
    if req.title.is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }
    let user_id = req.user_id.as_deref().unwrap_or(user_id_fallback);
    let task = state
        .document_store
        .create_task(&NewTask {
            title: &req.title,
            due_date: &req.due_date,
            priority: req.priority.unwrap_or(3),
            user_id,
        })
        .await?;
    Ok(task)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateGoalRequest {
    pub title: String,
    pub target_date: String,
    pub start_date: Option<String>,
    pub user_id: Option<String>,
}

pub async fn create_goal(state: &AppState, req: CreateGoalRequest, user_id_fallback: &str) -> Result<Goal, ApiError> {
    if req.title.is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }
    let user_id = req.user_id.as_deref().unwrap_or(user_id_fallback);
    let start_date = req.start_date.unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
    let goal = state
        .document_store
        .create_goal(&NewGoal {
            title: &req.title,
            start_date: &start_date,
            target_date: &req.target_date,
            user_id,
        })
        .await?;
    Ok(goal)
}

pub async fn list_tasks(state: &AppState, user_id: &str) -> Result<Vec<Task>, ApiError> {
    Ok(state.document_store.list_tasks(user_id).await?)
}

pub async fn get_task(state: &AppState, id: &str) -> Result<Task, ApiError> {
    Ok(state.document_store.get_task(id).await?)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ParseTaskRequest {
    pub input: String,
}

pub async fn parse_task(state: &AppState, req: ParseTaskRequest) -> Result<ParsedTask, ApiError> {
    let Some(llm) = &state.llm else {
        return Err(ApiError::bad_request("no LLM collaborator is configured"));
    };
    Ok(llm.parse_task(&req.input).await?)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GenerateSubtasksRequest {
    pub task_title: String,
    pub task_description: Option<String>,
}

pub async fn generate_subtasks(state: &AppState, req: GenerateSubtasksRequest) -> Result<Vec<Subtask>, ApiError> {
    let Some(llm) = &state.llm else {
        return Err(ApiError::bad_request("no LLM collaborator is configured"));
    };
    Ok(llm
        .generate_subtasks(&req.task_title, req.task_description.as_deref())
        .await?)
}

pub async fn analyze_productivity(state: &AppState, user_id: &str, days: u32) -> Result<ProductivitySummary, ApiError> {
    Ok(state.document_store.analyze_productivity(user_id, days).await?)
}

// --- axum wiring: thin extractor shims over the operations above ---

async fn create_task_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    create_task(&state, req, &state.auth.dev_subject).await.map(Json)
}

async fn create_goal_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateGoalRequest>,
) -> Result<Json<Goal>, ApiError> {
    create_goal(&state, req, &state.auth.dev_subject).await.map(Json)
}

#[derive(Debug, Deserialize)]
struct ListTasksQuery {
    user_id: Option<String>,
}

async fn list_tasks_handler(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let user_id = query.user_id.as_deref().unwrap_or(&state.auth.dev_subject);
    list_tasks(&state, user_id).await.map(Json)
}

async fn get_task_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Task>, ApiError> {
    get_task(&state, &id).await.map(Json)
}

async fn parse_task_handler(
    State(state): State<AppState>,
    Json(req): Json<ParseTaskRequest>,
) -> Result<Json<ParsedTask>, ApiError> {
    parse_task(&state, req).await.map(Json)
}

#[derive(Debug, Serialize)]
struct GenerateSubtasksResponse {
    subtasks: Vec<Subtask>,
}

async fn generate_subtasks_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateSubtasksRequest>,
) -> Result<Json<GenerateSubtasksResponse>, ApiError> {
    let subtasks = generate_subtasks(&state, req).await?;
    Ok(Json(GenerateSubtasksResponse { subtasks }))
}

/// `/api/tasks`, `/api/goals`, `/api/mcp/*` forwarding surface spec.md §6
/// lists, plus `/health` and `/ready` (C8 liveness/readiness).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", post(create_task_handler).get(list_tasks_handler))
        .route("/api/tasks/{id}", get(get_task_handler))
        .route("/api/goals", post(create_goal_handler))
        .route("/api/mcp/parse_task", post(parse_task_handler))
        .route("/api/mcp/generate_subtasks", post(generate_subtasks_handler))
        .route("/health", get(crate::health::liveness))
        .route("/ready", get(crate::health::readiness))
}
