//! Gateway configuration: startup YAML load plus atomically-replaceable hot-reload
//! domains (`agent_rules`, `tools_prompt`, `precise_context`, `model_router`).
//!
//! Precedence when a value can come from either source: explicit environment
//! variable > value from the YAML file. This mirrors the env-wins precedence the
//! workspace's `.env` loader used, narrowed here to a single YAML document.

mod dotenv;
pub mod domains;
mod reload;

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

pub use domains::{
    AgentMatcher, AgentRule, AgentRulesConfig, AnalyzerConfig, ModelRouterConfig,
    PreciseContextConfig, PriorityCandidate, PriorityRouterConfig, PromptMode, SemanticCandidate,
    SemanticRouterConfig, ToolBackendConfig, ToolsPromptConfig,
};
pub use reload::{ConfigDomain, ConfigUpdates, NoopConfigUpdates, PollingConfigUpdates};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Upstream LLM client settings (idle timeout, retry budget; see §5 of the design doc).
#[derive(Debug, Clone, Deserialize)]
pub struct LlmClientConfig {
    pub llm_endpoint: String,
    #[serde(default)]
    pub llm_token: Option<String>,
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    #[serde(default = "default_idle_timeout_ms")]
    pub total_idle_timeout_ms: u64,
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

fn default_idle_timeout_ms() -> u64 {
    180_000
}

fn default_max_retry_count() -> u32 {
    1
}

fn default_retry_interval_ms() -> u64 {
    5_000
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Request-id validation settings (`x-request-id` header, §6).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub enable_time_verify: bool,
    #[serde(default = "default_time_window_secs")]
    pub time_window_secs: i64,
}

fn default_time_window_secs() -> i64 {
    300
}

/// Localized UI filler strings used by the streaming orchestrator while a tool runs.
/// Kept configurable per the distilled spec's open question rather than hard-coded.
#[derive(Debug, Clone, Deserialize)]
pub struct UiTextConfig {
    #[serde(default = "default_searching_prefix")]
    pub searching_prefix: String,
    #[serde(default = "default_searching_suffix")]
    pub searching_suffix: String,
    #[serde(default = "default_done_text")]
    pub done_text: String,
}

fn default_searching_prefix() -> String {
    "\n#### \u{1f50d} ".to_string()
}

fn default_searching_suffix() -> String {
    "\u{5de5}\u{5177}\u{68c0}\u{7d22}\u{4e2d}".to_string()
}

fn default_done_text() -> String {
    "\n#### \u{1f4a1} \u{68c0}\u{7d22}\u{5df2}\u{5b8c}\u{6210}，\u{5206}\u{6790}\u{4e2d}..."
        .to_string()
}

impl Default for UiTextConfig {
    fn default() -> Self {
        Self {
            searching_prefix: default_searching_prefix(),
            searching_suffix: default_searching_suffix(),
            done_text: default_done_text(),
        }
    }
}

/// Top-level, startup-loaded YAML configuration. Does not include the four
/// hot-reloadable domains; those live in [`ConfigStore`].
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub llm: LlmClientConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub ui_text: UiTextConfig,
}

/// Loads `GatewayConfig` from a YAML file, then lets matching `GATEWAY_*` env vars
/// override a handful of fields that operators commonly override per-deployment.
pub fn load_gateway_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let mut cfg: GatewayConfig = serde_yaml::from_str(&content)?;
    if let Ok(addr) = std::env::var("GATEWAY_BIND_ADDR") {
        cfg.server.bind_addr = addr;
    }
    if let Ok(endpoint) = std::env::var("GATEWAY_LLM_ENDPOINT") {
        cfg.llm.llm_endpoint = endpoint;
    }
    if let Ok(token) = std::env::var("GATEWAY_LLM_TOKEN") {
        cfg.llm.llm_token = Some(token);
    }
    Ok(cfg)
}

/// Loads a project `.env` file (if present) into the process environment, without
/// overwriting variables already set. Call once at startup before
/// [`load_gateway_config`] so `GATEWAY_*` overrides can come from either source.
pub fn load_dotenv(override_dir: Option<&Path>) -> std::io::Result<()> {
    let map = dotenv::load_env_map(override_dir)?;
    for (key, value) in map {
        if std::env::var(&key).is_err() {
            std::env::set_var(key, value);
        }
    }
    Ok(())
}

/// The four hot-reloadable domains, bundled so a single `RwLock` guards all of them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigDomains {
    pub agent_rules: AgentRulesConfig,
    pub tools_prompt: ToolsPromptConfig,
    pub precise_context: PreciseContextConfig,
    pub model_router: Option<ModelRouterConfig>,
}

/// Process-wide holder for the hot-reloadable config domains.
///
/// Readers take a cheap `Arc` clone under a read lock; a reload replaces the
/// whole `Arc<ConfigDomains>` under a write lock in one atomic swap, so no
/// reader ever observes a half-updated bundle. Grounded on the teacher's
/// `CachedResolver`/`ResolverRefresher` pattern of swapping a whole resolver
/// value rather than mutating fields in place.
pub struct ConfigStore {
    inner: RwLock<Arc<ConfigDomains>>,
}

impl ConfigStore {
    pub fn new(initial: ConfigDomains) -> Self {
        Self {
            inner: RwLock::new(Arc::new(initial)),
        }
    }

    /// Returns a cheap snapshot of the current domains.
    pub async fn snapshot(&self) -> Arc<ConfigDomains> {
        self.inner.read().await.clone()
    }

    /// Atomically replaces one domain, leaving the other three untouched.
    pub async fn reload_domain(&self, domain: ConfigDomain) {
        let mut guard = self.inner.write().await;
        let mut next = ConfigDomains::clone(&guard);
        match domain {
            ConfigDomain::AgentRules(v) => next.agent_rules = v,
            ConfigDomain::ToolsPrompt(v) => next.tools_prompt = v,
            ConfigDomain::PreciseContext(v) => next.precise_context = v,
            ConfigDomain::ModelRouter(v) => next.model_router = Some(v),
        }
        *guard = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_yaml(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn load_gateway_config_parses_minimal_yaml() {
        let f = write_temp_yaml(
            r#"
llm:
  llm_endpoint: "https://upstream.example.com/v1/chat/completions"
"#,
        );
        let cfg = load_gateway_config(f.path()).unwrap();
        assert_eq!(cfg.llm.idle_timeout_ms, 180_000);
        assert_eq!(cfg.server.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn env_override_wins_over_yaml_bind_addr() {
        let f = write_temp_yaml(
            r#"
server:
  bind_addr: "127.0.0.1:9000"
llm:
  llm_endpoint: "https://upstream.example.com/v1/chat/completions"
"#,
        );
        std::env::set_var("GATEWAY_BIND_ADDR", "127.0.0.1:7777");
        let cfg = load_gateway_config(f.path()).unwrap();
        std::env::remove_var("GATEWAY_BIND_ADDR");
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:7777");
    }

    #[tokio::test]
    async fn config_store_reload_replaces_only_named_domain() {
        let store = ConfigStore::new(ConfigDomains::default());
        let before = store.snapshot().await;
        assert!(before.model_router.is_none());

        store
            .reload_domain(ConfigDomain::ToolsPrompt(ToolsPromptConfig {
                dedupe_environment_details: true,
                ..Default::default()
            }))
            .await;

        let after = store.snapshot().await;
        assert!(after.tools_prompt.dedupe_environment_details);
        assert!(after.model_router.is_none());
    }
}
