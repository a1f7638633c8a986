//! MCP JSON-RPC surface tests: authentication gate, the static catalog, and
//! dispatch error codes that don't require a live collaborator backend.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use mcp_productivity_gateway::auth::AuthState;
use mcp_productivity_gateway::collaborators::DocumentStoreClient;
use mcp_productivity_gateway::config::Config;
use mcp_productivity_gateway::server::build_router;
use mcp_productivity_gateway::state::AppState;

async fn test_app() -> (axum::Router, AuthState) {
    let config = Config {
        port: 0,
        host: "127.0.0.1".into(),
        jwt_secret: Some("test-signing-secret-not-for-production".into()),
        supabase_url: Some("https://documents.example".into()),
        supabase_anon_key: Some("test-key".into()),
        claude_api_key: None,
        log_level: "error".into(),
        gin_mode: "release".into(),
        app_env: "development".into(),
        public_url: Some("https://gateway.example".into()),
        trust_forwarded_headers: false,
        dev_subject: "dev-user".into(),
        rate_limit_per_second: 1000,
        rate_limit_burst: 1000,
    };

    let auth = AuthState::new(
        config.jwt_secret.as_deref().unwrap(),
        config.public_url.clone().unwrap(),
        config.dev_subject.clone(),
    )
    .await;
    let document_store = DocumentStoreClient::new(
        config.supabase_url.as_deref().unwrap(),
        config.supabase_anon_key.as_deref().unwrap(),
    );
    let state = AppState::new(auth.clone(), document_store, None, true);

    (build_router(&config, state), auth)
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn call_tool_without_bearer_token_is_rejected() {
    let (app, _auth) = test_app().await;

    let req = Request::builder()
        .method("POST")
        .uri("/mcp/call_tool")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "jsonrpc": "2.0", "id": 1, "method": "create_task", "params": {} }).to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], -32001);
}

#[tokio::test]
async fn initialize_without_bearer_token_is_rejected() {
    let (app, _auth) = test_app().await;

    let req = Request::builder()
        .method("POST")
        .uri("/mcp/initialize")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" }).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], -32001);
}

#[tokio::test]
async fn initialize_with_bearer_token_returns_the_capability_envelope() {
    let (app, auth) = test_app().await;
    let token = auth.tokens.issue_access("dev-user", "claude-desktop", "").unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/mcp/initialize")
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" }).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["result"]["protocolVersion"], "2025-06-18");
    assert_eq!(body["result"]["serverInfo"]["name"], "mcp-productivity-gateway");
}

#[tokio::test]
async fn list_tools_returns_the_five_tool_catalog() {
    let (app, auth) = test_app().await;
    let token = auth.tokens.issue_access("dev-user", "claude-desktop", "").unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/mcp/list_tools")
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(json!({ "jsonrpc": "2.0", "id": 1, "method": "list_tools" }).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let tools = body["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec!["create_task", "create_goal", "parse_task", "generate_subtasks", "analyze_productivity"]
    );
}

#[tokio::test]
async fn call_tool_with_unknown_method_returns_dash_32601() {
    let (app, auth) = test_app().await;
    let token = auth.tokens.issue_access("dev-user", "claude-desktop", "").unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/mcp/call_tool")
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(json!({ "jsonrpc": "2.0", "id": 7, "method": "delete_everything" }).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], -32601);
    assert_eq!(body["id"], 7);
}

#[tokio::test]
async fn call_tool_with_missing_required_param_returns_dash_32602() {
    let (app, auth) = test_app().await;
    let token = auth.tokens.issue_access("dev-user", "claude-desktop", "").unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/mcp/call_tool")
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(
            json!({ "jsonrpc": "2.0", "id": 2, "method": "create_task", "params": { "due_date": "2026-08-01" } })
                .to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], -32602);
}

#[tokio::test]
async fn call_tool_with_expired_token_is_rejected() {
    let (app, _auth) = test_app().await;

    let req = Request::builder()
        .method("POST")
        .uri("/mcp/call_tool")
        .header("content-type", "application/json")
        .header("Authorization", "Bearer not-a-real-token")
        .body(Body::from(json!({ "jsonrpc": "2.0", "id": 3, "method": "list_tasks" }).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
