use clap::Parser;

/// Environment and CLI configuration, ingested once at process start.
///
/// Shaped directly after spec.md §6's Environment table: every variable
/// there has a matching `env = "..."` flag here, following the teacher's
/// `Args` struct in its original `main.rs`.
#[derive(Parser, Debug, Clone)]
#[command(name = "mcp-productivity-gateway")]
#[command(about = "OAuth 2.1 authorization server + authenticated MCP gateway")]
pub struct Config {
    /// Port to bind to
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HMAC-SHA-256 signing secret for access tokens. Required in production.
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Document store base URL (external task/goal REST-over-HTTPS collaborator)
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Document store API key
    #[arg(long, env = "SUPABASE_ANON_KEY")]
    pub supabase_anon_key: Option<String>,

    /// LLM API key for natural-language task parsing (optional collaborator)
    #[arg(long, env = "CLAUDE_API_KEY")]
    pub claude_api_key: Option<String>,

    /// Log verbosity, passed straight through to EnvFilter
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Present for parity with the reference deployment; unused beyond logging
    #[arg(long, env = "GIN_MODE", default_value = "release")]
    pub gin_mode: String,

    /// "production" enforces a configured JWT_SECRET; any other value is development mode
    #[arg(long, env = "APP_ENV", default_value = "development")]
    pub app_env: String,

    /// Public base URL used to derive discovery document URLs
    #[arg(long, env = "PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Trust X-Forwarded-Proto when deriving the public URL (only enable
    /// behind a known reverse proxy — see spec.md §9 open question)
    #[arg(long, env = "TRUST_FORWARDED_HEADERS", default_value = "false")]
    pub trust_forwarded_headers: bool,

    /// Subject to assume when no authenticated session is wired up yet
    /// (the authorization endpoint assumes an already-authenticated subject;
    /// see spec.md §9 and Non-goals)
    #[arg(long, env = "DEV_SUBJECT", default_value = "dev-user")]
    pub dev_subject: String,

    /// Rate limit: requests per second per IP
    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value = "10")]
    pub rate_limit_per_second: u64,

    /// Rate limit: burst size
    #[arg(long, env = "RATE_LIMIT_BURST", default_value = "100")]
    pub rate_limit_burst: u32,
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Fails fast if required-in-production variables are missing, mirroring
    /// the teacher's `determine_auth_mode` validation pattern.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.is_production() && self.jwt_secret.is_none() {
            anyhow::bail!("JWT_SECRET is required when APP_ENV=production");
        }
        if self.supabase_url.is_none() || self.supabase_anon_key.is_none() {
            anyhow::bail!("SUPABASE_URL and SUPABASE_ANON_KEY are both required");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
