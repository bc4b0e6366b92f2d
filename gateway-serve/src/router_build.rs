//! Builds and caches a `RouterStrategy` from the `model_router` domain.
//!
//! `PriorityRouter`'s smooth-weighted-round-robin counters (§4.3) must persist
//! across requests to stay fair, so the strategy is rebuilt only when the
//! config generation actually changes rather than once per request — mirrors
//! the `ConfigStore`'s whole-value-swap pattern one level up.

use std::sync::Arc;

use config::{ConfigDomains, ModelRouterConfig};
use gateway_core::llm::LlmClient;
use gateway_core::router::{PriorityRouter, RouterStrategy, SemanticRouter};
use tokio::sync::RwLock;

fn build(router_config: &ModelRouterConfig, analyzer: Arc<dyn LlmClient>) -> RouterStrategy {
    match router_config {
        ModelRouterConfig::Semantic(cfg) => RouterStrategy::Semantic(SemanticRouter::new(cfg.clone(), analyzer)),
        ModelRouterConfig::Priority(cfg) => RouterStrategy::Priority(PriorityRouter::new(cfg.clone())),
    }
}

struct Cached {
    built_from: Arc<ConfigDomains>,
    strategy: Arc<RouterStrategy>,
}

pub struct RouterCache {
    analyzer: Arc<dyn LlmClient>,
    inner: RwLock<Option<Cached>>,
}

impl RouterCache {
    pub fn new(analyzer: Arc<dyn LlmClient>) -> Self {
        Self { analyzer, inner: RwLock::new(None) }
    }

    /// Returns the strategy for `domains.model_router`, rebuilding only if
    /// `domains` is a different snapshot than the one last built from.
    pub async fn get(&self, domains: &Arc<ConfigDomains>) -> Option<Arc<RouterStrategy>> {
        let router_config = domains.model_router.as_ref()?;

        if let Some(cached) = self.inner.read().await.as_ref() {
            if Arc::ptr_eq(&cached.built_from, domains) {
                return Some(cached.strategy.clone());
            }
        }

        let strategy = Arc::new(build(router_config, self.analyzer.clone()));
        let mut guard = self.inner.write().await;
        *guard = Some(Cached { built_from: domains.clone(), strategy: strategy.clone() });
        Some(strategy)
    }
}

