//! The four built-in RAG tool clients: `codebase_search`, `search_definitions`,
//! `search_references`, `knowledge_base_search`. Each wraps an HTTP call to an
//! external backend with identity-derived arguments.
//!
//! Grounded on the teacher's `WebToolsSource::with_client` pattern: one
//! shared, pooled `reqwest::Client` is injected rather than built per call
//! (§4.4 Ambient addition).

use async_trait::async_trait;
use config::ToolBackendConfig;
use serde::Serialize;

use crate::error::ChatError;
use crate::identity::Identity;

use super::params::{extract_tag, invalid_params_result, normalize_path_for_os, unescape_path};
use super::Tool;

/// Which XML parameter names a given tool expects, and the request query
/// parameter it maps to. A single generic client covers all four built-ins;
/// they differ only in name, parameter shape, and endpoint path.
#[derive(Debug, Clone, Copy)]
pub enum RagToolKind {
    CodebaseSearch,
    SearchDefinitions,
    SearchReferences,
    KnowledgeBaseSearch,
}

impl RagToolKind {
    pub fn name(self) -> &'static str {
        match self {
            RagToolKind::CodebaseSearch => "codebase_search",
            RagToolKind::SearchDefinitions => "search_definitions",
            RagToolKind::SearchReferences => "search_references",
            RagToolKind::KnowledgeBaseSearch => "knowledge_base_search",
        }
    }

    fn param_tags(self) -> &'static [&'static str] {
        match self {
            RagToolKind::CodebaseSearch => &["query"],
            RagToolKind::SearchDefinitions => &["symbol", "path"],
            RagToolKind::SearchReferences => &["symbol", "path"],
            RagToolKind::KnowledgeBaseSearch => &["query"],
        }
    }

    fn description(self) -> String {
        match self {
            RagToolKind::CodebaseSearch => {
                "## codebase_search\nSemantic search over the current codebase. Params: <query>.".to_string()
            }
            RagToolKind::SearchDefinitions => {
                "## search_definitions\nFind symbol definitions. Params: <symbol>, <path>.".to_string()
            }
            RagToolKind::SearchReferences => {
                "## search_references\nFind symbol references. Params: <symbol>, <path>.".to_string()
            }
            RagToolKind::KnowledgeBaseSearch => {
                "## knowledge_base_search\nSearch the project knowledge base. Params: <query>.".to_string()
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct RagRequestBody {
    client_id: Option<String>,
    codebase_path: Option<String>,
    auth_token: Option<String>,
    client_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    top_k: u32,
    score_threshold: f32,
}

pub struct RagToolClient {
    kind: RagToolKind,
    http: reqwest::Client,
    config: ToolBackendConfig,
    identity: Identity,
}

impl RagToolClient {
    pub fn new(kind: RagToolKind, http: reqwest::Client, config: ToolBackendConfig, identity: Identity) -> Self {
        Self { kind, http, config, identity }
    }

    fn build_body(&self, xml_body: &str) -> Result<RagRequestBody, ()> {
        let mut query = None;
        let mut symbol = None;
        let mut path = None;
        for tag in self.kind.param_tags() {
            let Some(raw) = extract_tag(xml_body, tag) else {
                return Err(());
            };
            match *tag {
                "query" => query = Some(raw.to_string()),
                "symbol" => symbol = Some(raw.to_string()),
                "path" => {
                    let unescaped = unescape_path(raw);
                    path = Some(normalize_path_for_os(&unescaped, self.identity.client_os.as_deref()));
                }
                _ => {}
            }
        }
        Ok(RagRequestBody {
            client_id: self.identity.client_id.clone(),
            codebase_path: self.identity.project_path.clone(),
            auth_token: self.identity.auth_token.clone(),
            client_version: self.identity.client_version.clone(),
            query,
            symbol,
            path,
            top_k: self.config.top_k,
            score_threshold: self.config.score_threshold,
        })
    }
}

#[async_trait]
impl Tool for RagToolClient {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn description(&self) -> String {
        self.kind.description()
    }

    async fn ready(&self) -> bool {
        let url = format!("{}/ready", self.config.base_url.trim_end_matches('/'));
        self.http
            .get(url)
            .timeout(std::time::Duration::from_millis(self.config.timeout_ms))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn execute(&self, xml_body: &str) -> Result<String, ChatError> {
        let Ok(body) = self.build_body(xml_body) else {
            return Ok(invalid_params_result());
        };

        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .json(&body)
            .timeout(std::time::Duration::from_millis(self.config.timeout_ms))
            .send()
            .await
            .map_err(ChatError::Transport)?;

        if !response.status().is_success() {
            return Ok(invalid_params_result());
        }

        let value: serde_json::Value = response.json().await.map_err(ChatError::Transport)?;
        Ok(value
            .get("result")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string())
    }
}
