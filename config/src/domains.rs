//! The four hot-reloadable configuration domains: `agent_rules`, `tools_prompt`,
//! `precise_context`, `model_router`.
//!
//! Each domain is its own `Deserialize`able value so a reload can replace exactly
//! one of them (see [`crate::ConfigStore::reload_domain`]) without touching the
//! other three or the static [`crate::GatewayConfig`].

use std::collections::HashMap;

use serde::Deserialize;

/// Caller-selected prompt-rewrite aggressiveness. Mirrors `extra_body.prompt_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    Raw,
    Balanced,
    Cost,
    Performance,
    Auto,
    Strict,
}

impl Default for PromptMode {
    fn default() -> Self {
        PromptMode::Auto
    }
}

/// One rule in the `agent_rules` domain: injected into the system message in
/// `strict` mode when the detected agent's first system line matches a key.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentRule {
    pub match_modes: Vec<PromptMode>,
    pub match_keys: Vec<String>,
    pub rules: String,
}

/// `agent_rules` domain: rules keyed by detected agent name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentRulesConfig {
    #[serde(default)]
    pub agents: HashMap<String, Vec<AgentRule>>,
}

/// One entry of the `{match_key -> agent_name}` list consulted by `AgentDetector`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentMatcher {
    pub match_key: String,
    pub agent_name: String,
}

/// `tools_prompt` domain: controls the server-side tool descriptions spliced into
/// the system prompt by `XmlToolAdapter`, and the agent-detection table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsPromptConfig {
    #[serde(default)]
    pub agent_matchers: Vec<AgentMatcher>,
    #[serde(default)]
    pub tool_use_rules_block: Option<String>,
    #[serde(default)]
    pub dedupe_environment_details: bool,
}

/// Per-tool settings for the RAG backends behind `codebase_search`,
/// `search_definitions`, `search_references`, `knowledge_base_search`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolBackendConfig {
    pub base_url: String,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default)]
    pub score_threshold: f32,
    #[serde(default = "default_tool_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_top_k() -> u32 {
    10
}

fn default_tool_timeout_ms() -> u64 {
    15_000
}

/// `precise_context` domain: one entry per built-in server-side tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreciseContextConfig {
    #[serde(default)]
    pub tools: HashMap<String, ToolBackendConfig>,
}

/// Per-label integer score for the semantic router strategy.
pub type LabelScores = HashMap<String, i32>;

#[derive(Debug, Clone, Deserialize)]
pub struct SemanticCandidate {
    pub model: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub scores: LabelScores,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SemanticRouterConfig {
    pub candidates: Vec<SemanticCandidate>,
    #[serde(default)]
    pub fallback_model_name: Option<String>,
    #[serde(default)]
    pub tie_break_order: Vec<String>,
    #[serde(default = "default_min_score")]
    pub min_score: i32,
    #[serde(default = "default_separator")]
    pub history_separator: String,
    #[serde(default)]
    pub strip_code_blocks: bool,
    #[serde(default = "default_max_user_messages")]
    pub max_user_messages: usize,
    #[serde(default = "default_max_history_bytes")]
    pub max_history_bytes: usize,
    pub analyzer: AnalyzerConfig,
}

fn default_min_score() -> i32 {
    1
}

fn default_separator() -> String {
    "\n\n".to_string()
}

fn default_max_user_messages() -> usize {
    10
}

fn default_max_history_bytes() -> usize {
    16_384
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    pub model: String,
    #[serde(default)]
    pub endpoint_override: Option<String>,
    #[serde(default)]
    pub token_override: Option<String>,
    #[serde(default = "default_analyzer_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub prompt_override: Option<String>,
}

fn default_analyzer_timeout_ms() -> u64 {
    3_000
}

fn default_labels() -> Vec<String> {
    vec![
        "simple_request".to_string(),
        "planning_request".to_string(),
        "code_modification".to_string(),
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriorityCandidate {
    pub model: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_priority() -> u32 {
    999
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriorityRouterConfig {
    pub candidates: Vec<PriorityCandidate>,
    #[serde(default)]
    pub fallback_model_name: Option<String>,
}

/// `model_router` domain: exactly one strategy is active at a time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum ModelRouterConfig {
    Semantic(SemanticRouterConfig),
    Priority(PriorityRouterConfig),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_router_config_parses_from_yaml() {
        let yaml = r#"
strategy: semantic
min_score: 1
analyzer:
  model: classifier-mini
candidates:
  - model: gpt-4o
    scores: { planning_request: 8 }
  - model: gpt-4o-mini
    scores: { planning_request: 5 }
"#;
        let cfg: ModelRouterConfig = serde_yaml::from_str(yaml).unwrap();
        match cfg {
            ModelRouterConfig::Semantic(s) => {
                assert_eq!(s.candidates.len(), 2);
                assert_eq!(s.analyzer.model, "classifier-mini");
            }
            ModelRouterConfig::Priority(_) => panic!("expected semantic"),
        }
    }

    #[test]
    fn priority_router_config_parses_from_yaml() {
        let yaml = r#"
strategy: priority
candidates:
  - model: a
    priority: 1
    weight: 5
  - model: b
    priority: 1
    weight: 3
"#;
        let cfg: ModelRouterConfig = serde_yaml::from_str(yaml).unwrap();
        match cfg {
            ModelRouterConfig::Priority(p) => assert_eq!(p.candidates.len(), 2),
            ModelRouterConfig::Semantic(_) => panic!("expected priority"),
        }
    }
}
