use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcp_productivity_gateway::auth::AuthState;
use mcp_productivity_gateway::collaborators::{DocumentStoreClient, LlmClient};
use mcp_productivity_gateway::config::Config;
use mcp_productivity_gateway::state::AppState;
use mcp_productivity_gateway::{auth, server};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::parse();
    config.validate()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    tracing::info!(app_env = %config.app_env, gin_mode = %config.gin_mode, "starting mcp-productivity-gateway");

    let signing_secret = auth::token::load_signing_secret(config.jwt_secret.as_deref(), config.is_production())?;

    let public_origin = config
        .public_url
        .clone()
        .unwrap_or_else(|| format!("http://{}", config.bind_addr()));

    let auth_state = AuthState::new(&signing_secret, public_origin, config.dev_subject.clone()).await;

    let document_store_configured = config.supabase_url.is_some() && config.supabase_anon_key.is_some();
    let document_store = DocumentStoreClient::new(
        config.supabase_url.as_deref().unwrap_or_default(),
        config.supabase_anon_key.as_deref().unwrap_or_default(),
    );
    let llm = config.claude_api_key.as_deref().map(LlmClient::new);

    let app_state = AppState::new(auth_state, document_store, llm, document_store_configured);

    server::serve(&config, app_state).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
