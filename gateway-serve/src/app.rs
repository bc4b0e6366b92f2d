//! `AppState` and route wiring (§6).

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use gateway_core::llm::LlmClient;
use gateway_core::log_sink::LogDispatcher;
use gateway_core::orchestrator::tool_status::ToolStatusStore;
use gateway_core::prompt::RulesInjector;

use crate::router_build::RouterCache;

pub struct AppState {
    pub config: config::GatewayConfig,
    pub config_store: config::ConfigStore,
    pub llm: Arc<dyn LlmClient>,
    pub router_cache: RouterCache,
    pub tool_status: Arc<dyn ToolStatusStore>,
    pub log_dispatcher: LogDispatcher,
    pub http: reqwest::Client,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub cancel: tokio_util::sync::CancellationToken,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: config::GatewayConfig,
        domains: config::ConfigDomains,
        http: reqwest::Client,
        llm: Arc<dyn LlmClient>,
        analyzer: Arc<dyn LlmClient>,
        tool_status: Arc<dyn ToolStatusStore>,
        log_dispatcher: LogDispatcher,
        metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
        cancel: tokio_util::sync::CancellationToken,
    ) -> Self {
        Self {
            config,
            config_store: config::ConfigStore::new(domains),
            llm,
            router_cache: RouterCache::new(analyzer),
            tool_status,
            log_dispatcher,
            http,
            metrics_handle,
            cancel,
        }
    }

    /// Builds the `RulesInjector` for the currently active `agent_rules` domain.
    /// Cheap enough (a few clones of short strings) to construct per request.
    pub fn rules_injector(&self, domains: &config::ConfigDomains) -> RulesInjector {
        RulesInjector::new(domains.agent_rules.clone())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat-rag/api/v1/chat/completions", post(crate::handlers::chat::completions))
        .route(
            "/chat-rag/api/v1/chat/requests/:request_id/status",
            get(crate::handlers::status::tool_status),
        )
        .route("/metrics", get(crate::handlers::metrics::metrics))
        .with_state(state)
}
