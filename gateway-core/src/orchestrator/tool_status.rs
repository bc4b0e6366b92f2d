//! The tool-status side channel (§4.2 Ambient addition): `tool_status:<request_id>`
//! → `{tool_name: running|success|failed}`, five-minute TTL.
//!
//! Grounded on the teacher's `dashmap`-backed caches (`model_spec/cached.rs`
//! uses a `RwLock<HashMap<...>>`; here we use `DashMap` directly for
//! lock-free per-key access matching the tool_source module's usage).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

const TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolRunStatus {
    Running,
    Success,
    Failed,
}

/// Trait boundary over the external tool-status key-value store (§4.2, §9:
/// "Tool-status map is external ... not in-process"). `InMemoryToolStatusStore`
/// is the standalone/test implementation; a real deployment would adapt this
/// trait over Redis or similar, which is out of scope per §6.
#[async_trait]
pub trait ToolStatusStore: Send + Sync {
    async fn set(&self, request_id: &str, tool_name: &str, status: ToolRunStatus);
    async fn get_all(&self, request_id: &str) -> std::collections::HashMap<String, ToolRunStatus>;
}

struct Entry {
    status: ToolRunStatus,
    expires_at: Instant,
}

pub struct InMemoryToolStatusStore {
    inner: Arc<DashMap<String, std::collections::HashMap<String, Entry>>>,
}

impl InMemoryToolStatusStore {
    pub fn new() -> Self {
        Self { inner: Arc::new(DashMap::new()) }
    }

    /// Spawns a background task that periodically evicts expired entries.
    /// Cancelled via the caller's `CancellationToken` on shutdown (§5).
    pub fn spawn_sweeper(self: &Arc<Self>, cancel: tokio_util::sync::CancellationToken, interval: Duration) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let now = Instant::now();
                        inner.retain(|_, tools| {
                            tools.retain(|_, entry| entry.expires_at > now);
                            !tools.is_empty()
                        });
                    }
                }
            }
        });
    }
}

impl Default for InMemoryToolStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolStatusStore for InMemoryToolStatusStore {
    async fn set(&self, request_id: &str, tool_name: &str, status: ToolRunStatus) {
        let mut tools = self.inner.entry(request_id.to_string()).or_default();
        tools.insert(
            tool_name.to_string(),
            Entry {
                status,
                expires_at: Instant::now() + TTL,
            },
        );
    }

    async fn get_all(&self, request_id: &str) -> std::collections::HashMap<String, ToolRunStatus> {
        let now = Instant::now();
        self.inner
            .get(request_id)
            .map(|tools| {
                tools
                    .iter()
                    .filter(|(_, e)| e.expires_at > now)
                    .map(|(name, e)| (name.clone(), e.status))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_all_returns_status() {
        let store = InMemoryToolStatusStore::new();
        store.set("req-1", "codebase_search", ToolRunStatus::Running).await;
        let statuses = store.get_all("req-1").await;
        assert_eq!(statuses.get("codebase_search"), Some(&ToolRunStatus::Running));
    }

    #[tokio::test]
    async fn overwrites_status_for_same_tool() {
        let store = InMemoryToolStatusStore::new();
        store.set("req-1", "codebase_search", ToolRunStatus::Running).await;
        store.set("req-1", "codebase_search", ToolRunStatus::Success).await;
        let statuses = store.get_all("req-1").await;
        assert_eq!(statuses.get("codebase_search"), Some(&ToolRunStatus::Success));
    }

    #[tokio::test]
    async fn unknown_request_id_returns_empty() {
        let store = InMemoryToolStatusStore::new();
        assert!(store.get_all("missing").await.is_empty());
    }
}
