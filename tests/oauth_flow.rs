//! End-to-end OAuth 2.1 flow tests against the real router, per spec.md §8's
//! testable properties. Builds the actual `AppState`/`Router` rather than
//! mocking handlers, following the pattern in the pack's
//! `trovato-kernel` integration tests (`tests/common/mod.rs`).

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use mcp_productivity_gateway::auth::AuthState;
use mcp_productivity_gateway::collaborators::{DocumentStoreClient, LlmClient};
use mcp_productivity_gateway::config::Config;
use mcp_productivity_gateway::server::build_router;
use mcp_productivity_gateway::state::AppState;

async fn test_app() -> (axum::Router, Config) {
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
    let llm: Option<LlmClient> = None;
    let state = AppState::new(auth, document_store, llm, true);

    (build_router(&config, state), config)
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn authorize_then_exchange_code_for_tokens() {
    let (app, _config) = test_app().await;

    let authorize_req = Request::builder()
        .uri(
            "/authorize?client_id=claude-desktop&redirect_uri=http%3A%2F%2Flocalhost&\
             response_type=code&state=xyz&code_challenge=verifier0123456789abcdefghijklmnopqrstuvwxyz0123",
        )
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(authorize_req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp.headers().get("location").unwrap().to_str().unwrap().to_string();
    let redirected = url::Url::parse(&location).unwrap();
    let code = redirected
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .expect("authorize redirect must carry a code");

    let token_req = Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "grant_type": "authorization_code",
                "code": code,
                "client_id": "claude-desktop",
                "redirect_uri": "http://localhost",
                "code_verifier": "verifier0123456789abcdefghijklmnopqrstuvwxyz0123",
            })
            .to_string(),
        ))
        .unwrap();
    let resp = app.clone().oneshot(token_req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].as_str().unwrap().contains('.'));
    assert!(body["refresh_token"].is_string());
}

#[tokio::test]
async fn authorization_code_cannot_be_replayed() {
    let (app, _config) = test_app().await;

    let authorize_req = Request::builder()
        .uri("/authorize?client_id=mcp-generic-client&redirect_uri=http%3A%2F%2Flocalhost&response_type=code&state=s1")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(authorize_req).await.unwrap();
    let location = resp.headers().get("location").unwrap().to_str().unwrap().to_string();
    let redirected = url::Url::parse(&location).unwrap();
    let code = redirected
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    let make_req = || {
        Request::builder()
            .method("POST")
            .uri("/oauth/token")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({
                    "grant_type": "authorization_code",
                    "code": code,
                    "client_id": "mcp-generic-client",
                    "redirect_uri": "http://localhost",
                })
                .to_string(),
            ))
            .unwrap()
    };

    let first = app.clone().oneshot(make_req()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.clone().oneshot(make_req()).await.unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body = body_json(second).await;
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn wrong_pkce_verifier_is_rejected() {
    let (app, _config) = test_app().await;

    let authorize_req = Request::builder()
        .uri(
            "/authorize?client_id=claude-desktop&redirect_uri=http%3A%2F%2Flocalhost&\
             response_type=code&state=abc&code_challenge=verifier0123456789abcdefghijklmnopqrstuvwxyz0123",
        )
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(authorize_req).await.unwrap();
    let location = resp.headers().get("location").unwrap().to_str().unwrap().to_string();
    let code = url::Url::parse(&location)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    let token_req = Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "grant_type": "authorization_code",
                "code": code,
                "client_id": "claude-desktop",
                "redirect_uri": "http://localhost",
                "code_verifier": "totally-the-wrong-verifier",
            })
            .to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(token_req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn unknown_client_id_fails_authorization() {
    let (app, _config) = test_app().await;

    let req = Request::builder()
        .uri("/authorize?client_id=ghost-client&redirect_uri=http%3A%2F%2Flocalhost&response_type=code&state=abc")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp.headers().get("location").unwrap().to_str().unwrap().to_string();
    let redirected = url::Url::parse(&location).unwrap();
    assert_eq!(redirected.query_pairs().find(|(k, _)| k == "error").unwrap().1, "invalid_client");
}

#[tokio::test]
async fn missing_state_parameter_is_rejected() {
    let (app, _config) = test_app().await;

    let req = Request::builder()
        .uri("/authorize?client_id=claude-desktop&redirect_uri=http%3A%2F%2Flocalhost&response_type=code")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp.headers().get("location").unwrap().to_str().unwrap().to_string();
    let redirected = url::Url::parse(&location).unwrap();
    assert_eq!(redirected.query_pairs().find(|(k, _)| k == "error").unwrap().1, "invalid_request");
}

#[tokio::test]
async fn discovery_metadata_reflects_public_origin() {
    let (app, _config) = test_app().await;

    let req = Request::builder()
        .uri("/.well-known/oauth-authorization-server")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["issuer"], "https://gateway.example");
    assert_eq!(body["grant_types_supported"], json!(["authorization_code", "refresh_token"]));
}

#[tokio::test]
async fn refresh_token_grant_rotates_the_token() {
    let (app, _config) = test_app().await;

    let authorize_req = Request::builder()
        .uri("/authorize?client_id=mcp-generic-client&redirect_uri=http%3A%2F%2Flocalhost&response_type=code&state=r1")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(authorize_req).await.unwrap();
    let location = resp.headers().get("location").unwrap().to_str().unwrap().to_string();
    let code = url::Url::parse(&location)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    let token_req = Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "grant_type": "authorization_code", "code": code, "client_id": "mcp-generic-client" }).to_string(),
        ))
        .unwrap();
    let resp = app.clone().oneshot(token_req).await.unwrap();
    let first_tokens = body_json(resp).await;
    let refresh_token = first_tokens["refresh_token"].as_str().unwrap().to_string();

    let refresh_req = Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "grant_type": "refresh_token", "refresh_token": refresh_token }).to_string(),
        ))
        .unwrap();
    let resp = app.clone().oneshot(refresh_req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let second_tokens = body_json(resp).await;
    assert_ne!(second_tokens["refresh_token"], first_tokens["refresh_token"]);

    // the old refresh token is revoked on rotation
    let reuse_req = Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "grant_type": "refresh_token", "refresh_token": refresh_token }).to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(reuse_req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
