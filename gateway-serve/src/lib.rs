//! HTTP/SSE layer for the chat-rag gateway (axum).
//!
//! Exposes `POST /chat-rag/api/v1/chat/completions`, `GET
//! /chat-rag/api/v1/chat/requests/:requestId/status`, and `GET /metrics`.
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`], [`build_app_state`].

mod app;
mod handlers;
mod identity_headers;
mod request;
mod router_build;
mod tools_build;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

pub use app::{router, AppState};

use gateway_core::llm::{HttpLlmClient, LlmClientConfig};
use gateway_core::log_sink::{LogDispatcher, StdoutLogSink};
use gateway_core::orchestrator::tool_status::InMemoryToolStatusStore;

/// Builds the process-wide `AppState`: one `HttpLlmClient` shared as both the
/// main model client and the router's analyzer client (a deployment with a
/// distinct analyzer endpoint would construct a second `HttpLlmClient` here),
/// a stdout log sink, a swept in-memory tool-status store, and a fresh
/// Prometheus recorder.
pub fn build_app_state(
    config: config::GatewayConfig,
    domains: config::ConfigDomains,
    cancel: tokio_util::sync::CancellationToken,
) -> Arc<AppState> {
    let http = reqwest::Client::new();
    let llm = Arc::new(HttpLlmClient::new(http.clone(), LlmClientConfig::from(&config.llm)));
    let analyzer = llm.clone();

    let log_dispatcher = LogDispatcher::spawn(Arc::new(StdoutLogSink), 1024, cancel.clone());

    let tool_status = Arc::new(InMemoryToolStatusStore::new());
    tool_status.spawn_sweeper(cancel.clone(), Duration::from_secs(60));

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("prometheus recorder installs exactly once per process");

    Arc::new(AppState::new(
        config,
        domains,
        http,
        llm,
        analyzer,
        tool_status,
        log_dispatcher,
        metrics_handle,
        cancel,
    ))
}

/// Runs the HTTP server on an existing listener, shutting down gracefully
/// when `cancel` fires. Used directly by tests (bind to `127.0.0.1:0`).
pub async fn run_serve_on_listener(
    listener: TcpListener,
    state: Arc<AppState>,
    cancel: tokio_util::sync::CancellationToken,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("chat-rag gateway listening on http://{addr}");

    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await?;
    Ok(())
}

/// Binds `addr` and runs the HTTP server until `cancel` fires.
pub async fn run_serve(
    addr: &str,
    state: Arc<AppState>,
    cancel: tokio_util::sync::CancellationToken,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, state, cancel).await
}
