//! Request Pipeline — C8.
//!
//! Grounded in the teacher's `run_sse_server_with_oauth` (`main.rs`):
//! per-request rate limiting via `tower_governor`'s `SmartIpKeyExtractor`,
//! request-id + structured JSON logging via `tower_http::trace`, panic
//! recovery via `tower_http::catch_panic`, permissive CORS for the non-MCP
//! REST surface, and a signal-driven graceful shutdown with a draining
//! period. Route assembly merges the OAuth, REST, and MCP surfaces built
//! by `auth::routes`, `rest::router`, and `mcp::router`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{Request, Response};
use tokio::net::TcpListener;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::config::Config;
use crate::state::AppState;

const SHUTDOWN_DRAIN: Duration = Duration::from_secs(30);

/// spec.md §5's "read 15s, write 15s" server timeouts. Tower's `Service`
/// abstraction doesn't expose separate read/write phases to middleware, so
/// both collapse into one request/response-cycle deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// spec.md §5's "idle 60s" bound, applied as an outer backstop around the
/// whole layered stack (including any time spent queued behind rate
/// limiting) — a connection-level idle-keepalive timeout isn't reachable
/// through tower layers without bypassing `axum::serve` for raw hyper
/// connection config, which no production path in this codebase does.
const IDLE_BACKSTOP_TIMEOUT: Duration = Duration::from_secs(60);

pub fn build_router(config: &Config, state: AppState) -> Router {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .finish()
            .expect("rate limiter config should be well-formed"),
    );
    let governor_limiter = governor_conf.limiter().clone();
    let rate_limit_layer = GovernorLayer::new(governor_conf);

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            governor_limiter.retain_recent();
        }
    });

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<_>| {
            tracing::info_span!(
                "request",
                request_id = %uuid::Uuid::new_v4(),
                method = %req.method(),
                path = %req.uri().path(),
                status = tracing::field::Empty,
                duration_ms = tracing::field::Empty,
            )
        })
        .on_response(|resp: &Response<_>, latency: Duration, span: &Span| {
            span.record("status", resp.status().as_u16());
            span.record("duration_ms", latency.as_millis() as u64);
            tracing::info!(parent: span, "request completed");
        });

    crate::auth::routes()
        .merge(crate::mcp::router(state.clone()))
        .merge(crate::rest::router())
        .layer(TimeoutLayer::new(IDLE_BACKSTOP_TIMEOUT))
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::new())
        .layer(trace_layer)
        .layer(rate_limit_layer)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

/// Binds the listener and serves until a shutdown signal arrives. Once a
/// signal fires, `with_graceful_shutdown` stops accepting new connections
/// and waits for in-flight requests to finish; [`shutdown_then_arm_drain_deadline`]
/// races that wait against [`SHUTDOWN_DRAIN`] and force-exits the process if
/// it's still running past the deadline, per spec.md §5's hard cancellation rule.
pub async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    let app = build_router(config, state);
    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "server ready");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_then_arm_drain_deadline())
        .await?;

    Ok(())
}

/// Waits for the shutdown signal, then returns so the caller's
/// `with_graceful_shutdown` begins draining in-flight requests. Concurrently
/// arms a deadline timer that force-exits the process after [`SHUTDOWN_DRAIN`]
/// if the drain hasn't finished by then — the clock starts at shutdown, not
/// at process start.
async fn shutdown_then_arm_drain_deadline() {
    shutdown_signal().await;
    tokio::spawn(async {
        tokio::time::sleep(SHUTDOWN_DRAIN).await;
        tracing::warn!(
            drain_secs = SHUTDOWN_DRAIN.as_secs(),
            "drain deadline reached; exiting with requests still in flight"
        );
        std::process::exit(0);
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
