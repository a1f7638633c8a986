//! MCP Dispatcher — C10.
//!
//! Parses JSON-RPC envelopes for the three MCP endpoints spec.md §4.10
//! names and re-enters `crate::rest`'s operations under the caller's
//! authenticated identity (attached by `auth::middleware::mcp_auth_middleware`).
//! Internally a response is a tagged union (`DispatchOutcome`) per
//! SPEC_FULL.md §9's "JSON-RPC response envelope" note; it is serialized
//! to the wire `{jsonrpc, id, result|error}` shape only at the boundary.

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::auth::middleware::AuthenticatedSubject;
use crate::error::{ApiError, DispatchErrorCode};
use crate::rest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct McpRequest {
    #[serde(rename = "jsonrpc")]
    pub _jsonrpc: Option<String>,
    pub id: Option<Value>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

enum DispatchOutcome {
    Ok(Value),
    Err { code: i64, message: String },
}

fn envelope(id: Option<Value>, outcome: DispatchOutcome) -> Response {
    let id = id.unwrap_or(Value::Null);
    let body = match outcome {
        DispatchOutcome::Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        DispatchOutcome::Err { code, message } => {
            json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
        }
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// `POST /mcp/initialize`: fixed capability envelope.
pub async fn initialize_handler(Json(req): Json<McpRequest>) -> Response {
    envelope(
        req.id,
        DispatchOutcome::Ok(json!({
            "protocolVersion": "2025-06-18",
            "capabilities": { "logging": {}, "tools": {} },
            "serverInfo": { "name": "mcp-productivity-gateway", "version": env!("CARGO_PKG_VERSION") },
        })),
    )
}

/// `POST /mcp/list_tools`: the static tool catalog.
pub async fn list_tools_handler(Json(req): Json<McpRequest>) -> Response {
    envelope(req.id, DispatchOutcome::Ok(json!({ "tools": super::tools::catalog() })))
}

/// `POST /mcp/call_tool`: `method` selects a tool; `params` supplies its
/// arguments. Re-enters the matching `crate::rest` operation in-process.
pub async fn call_tool_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<AuthenticatedSubject>,
    Json(req): Json<McpRequest>,
) -> Response {
    let id = req.id.clone();
    match dispatch(&state, &subject.0, &req).await {
        Ok(result) => envelope(id, DispatchOutcome::Ok(result)),
        Err(outcome) => envelope(id, outcome),
    }
}

fn param_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

fn param_u32(params: &Map<String, Value>, key: &str) -> Option<u32> {
    params.get(key).and_then(Value::as_u64).map(|v| v as u32)
}

async fn dispatch(state: &AppState, subject: &str, req: &McpRequest) -> Result<Value, DispatchOutcome> {
    let api_err_to_outcome = |e: ApiError| DispatchOutcome::Err {
        code: DispatchErrorCode::CollaboratorFailure.code(),
        message: e.message,
    };

    match req.method.as_str() {
        "create_task" => {
            let title = param_str(&req.params, "title")
                .ok_or_else(|| missing_param("title"))?
                .to_string();
            let due_date = param_str(&req.params, "due_date")
                .ok_or_else(|| missing_param("due_date"))?
                .to_string();
            let priority = param_u32(&req.params, "priority").map(|p| p as u8);
            let user_id = param_str(&req.params, "user_id").map(str::to_string);

            let task = rest::create_task(
                state,
                rest::CreateTaskRequest { title, due_date, priority, user_id },
                subject,
            )
            .await
            .map_err(api_err_to_outcome)?;
            serde_json::to_value(task).map_err(|e| internal_error(e.to_string()))
        }
        "create_goal" => {
            let title = param_str(&req.params, "title")
                .ok_or_else(|| missing_param("title"))?
                .to_string();
            let target_date = param_str(&req.params, "target_date")
                .ok_or_else(|| missing_param("target_date"))?
                .to_string();
            let start_date = param_str(&req.params, "start_date").map(str::to_string);
            let user_id = param_str(&req.params, "user_id").map(str::to_string);

            let goal = rest::create_goal(
                state,
                rest::CreateGoalRequest { title, target_date, start_date, user_id },
                subject,
            )
            .await
            .map_err(api_err_to_outcome)?;
            serde_json::to_value(goal).map_err(|e| internal_error(e.to_string()))
        }
        "parse_task" => {
            let input = param_str(&req.params, "input")
                .ok_or_else(|| missing_param("input"))?
                .to_string();
            let parsed = rest::parse_task(state, rest::ParseTaskRequest { input })
                .await
                .map_err(api_err_to_outcome)?;
            serde_json::to_value(parsed).map_err(|e| internal_error(e.to_string()))
        }
        "generate_subtasks" => {
            let task_title = param_str(&req.params, "task_title")
                .ok_or_else(|| missing_param("task_title"))?
                .to_string();
            let task_description = param_str(&req.params, "task_description").map(str::to_string);
            let subtasks = rest::generate_subtasks(
                state,
                rest::GenerateSubtasksRequest { task_title, task_description },
            )
            .await
            .map_err(api_err_to_outcome)?;
            serde_json::to_value(json!({ "subtasks": subtasks })).map_err(|e| internal_error(e.to_string()))
        }
        "analyze_productivity" => {
            let user_id = param_str(&req.params, "user_id")
                .ok_or_else(|| missing_param("user_id"))?
                .to_string();
            let days = param_u32(&req.params, "days").unwrap_or(7);
            let summary = rest::analyze_productivity(state, &user_id, days)
                .await
                .map_err(api_err_to_outcome)?;
            serde_json::to_value(summary).map_err(|e| internal_error(e.to_string()))
        }
        other => Err(DispatchOutcome::Err {
            code: DispatchErrorCode::UnknownMethod.code(),
            message: format!("Unknown method: {other}"),
        }),
    }
}

fn missing_param(name: &str) -> DispatchOutcome {
    DispatchOutcome::Err {
        code: DispatchErrorCode::InvalidParams.code(),
        message: format!("Missing required parameter: {name}"),
    }
}

fn internal_error(message: String) -> DispatchOutcome {
    DispatchOutcome::Err { code: DispatchErrorCode::CollaboratorFailure.code(), message }
}
