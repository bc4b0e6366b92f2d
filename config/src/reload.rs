//! Remote config push channel abstraction (§6: "a remote key-value configuration
//! service that pushes updates for four named configs").
//!
//! The gateway never talks to a concrete remote config service directly; it
//! polls an implementation of [`ConfigUpdates`]. Production deployments wire in
//! whatever transport fits (a long-poll HTTP endpoint, a gRPC stream, etc.) by
//! implementing this trait; this crate only ships the two implementations that
//! are transport-agnostic: a no-op and a local-file poller for dev/single-node use.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::domains::{AgentRulesConfig, ModelRouterConfig, PreciseContextConfig, ToolsPromptConfig};

/// One pushed update: replaces exactly one of the four hot-reloadable domains.
#[derive(Debug, Clone)]
pub enum ConfigDomain {
    AgentRules(AgentRulesConfig),
    ToolsPrompt(ToolsPromptConfig),
    PreciseContext(PreciseContextConfig),
    ModelRouter(ModelRouterConfig),
}

/// Source of hot-reload pushes. `next_update` should not return until there is
/// an update to apply; callers loop on it for the lifetime of the process.
#[async_trait]
pub trait ConfigUpdates: Send + Sync {
    async fn next_update(&mut self) -> ConfigDomain;
}

/// Never produces an update. Used when no remote config service is configured;
/// the gateway then runs entirely off the values loaded at startup.
pub struct NoopConfigUpdates;

#[async_trait]
impl ConfigUpdates for NoopConfigUpdates {
    async fn next_update(&mut self) -> ConfigDomain {
        std::future::pending().await
    }
}

/// Re-reads one YAML file on a fixed interval and, when its modification time
/// has advanced, parses and yields it as a [`ConfigDomain::ModelRouter`] update.
///
/// Intended for local/dev use or single-node deployments that would rather edit
/// a file than stand up a remote config push service; satisfies the "atomically
/// replaces its in-memory value" contract by only ever yielding a whole,
/// successfully-parsed domain value.
pub struct PollingConfigUpdates {
    path: PathBuf,
    interval: Duration,
    last_modified: Option<std::time::SystemTime>,
}

impl PollingConfigUpdates {
    pub fn new(path: PathBuf, interval: Duration) -> Self {
        Self {
            path,
            interval,
            last_modified: None,
        }
    }

    fn read_if_changed(&mut self) -> Option<ModelRouterConfig> {
        let metadata = std::fs::metadata(&self.path).ok()?;
        let modified = metadata.modified().ok()?;
        if Some(modified) == self.last_modified {
            return None;
        }
        let content = std::fs::read_to_string(&self.path).ok()?;
        let parsed: ModelRouterConfig = serde_yaml::from_str(&content).ok()?;
        self.last_modified = Some(modified);
        Some(parsed)
    }
}

#[async_trait]
impl ConfigUpdates for PollingConfigUpdates {
    async fn next_update(&mut self) -> ConfigDomain {
        loop {
            if let Some(cfg) = self.read_if_changed() {
                return ConfigDomain::ModelRouter(cfg);
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::time::timeout;

    #[tokio::test]
    async fn noop_config_updates_never_resolves() {
        let mut updates = NoopConfigUpdates;
        let result = timeout(Duration::from_millis(50), updates.next_update()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn polling_config_updates_yields_on_file_change() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "strategy: priority\ncandidates:\n  - model: a\n    priority: 1\n    weight: 1\n"
        )
        .unwrap();

        let mut updates = PollingConfigUpdates::new(file.path().to_path_buf(), Duration::from_millis(10));
        let update = timeout(Duration::from_secs(2), updates.next_update())
            .await
            .expect("should yield once file is readable");
        assert!(matches!(update, ConfigDomain::ModelRouter(ModelRouterConfig::Priority(_))));
    }
}
