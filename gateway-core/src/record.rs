//! Per-request structured log record (§3 `ToolCall record`, `ChatRecord`).

use std::time::Duration;

use serde::Serialize;

use crate::error::ChatError;
use crate::identity::Identity;
use crate::prompt::TokenMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolResultStatus {
    Running,
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub raw_input: String,
    pub raw_output: String,
    pub status: ToolResultStatus,
    pub latency_ms: u64,
    pub error_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LatencyMetrics {
    pub main_model_ms: u64,
    pub total_ms: u64,
    pub first_token_ms: u64,
    pub window_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpstreamUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One record per request, handed to the bounded log-dispatch queue (§4.6)
/// after the response completes. Classification category is left `None` here
/// and filled in later by a log-side classifier, out of scope for this crate.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRecord {
    pub request_id: String,
    pub identity_user_name: Option<String>,
    pub identity_client_id: Option<String>,
    pub timestamp_unix: u64,
    pub model_requested: String,
    pub model_selected: Option<String>,
    pub prompt_mode: String,
    pub token_metrics: TokenMetricsRecord,
    pub is_prompt_proceed: bool,
    pub is_compressed: bool,
    pub latency: LatencyMetrics,
    pub tool_calls: Vec<ToolCallRecord>,
    pub original_messages_json: String,
    pub processed_messages_json: String,
    pub final_response_excerpt: String,
    pub response_headers: Vec<(String, String)>,
    pub upstream_usage: Option<UpstreamUsage>,
    pub classification_category: Option<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenMetricsRecord {
    pub original_system_tokens: usize,
    pub processed_system_tokens: usize,
    pub original_total_tokens: usize,
    pub processed_total_tokens: usize,
    pub ratio: f64,
}

impl From<&TokenMetrics> for TokenMetricsRecord {
    fn from(m: &TokenMetrics) -> Self {
        Self {
            original_system_tokens: m.original_system_tokens,
            processed_system_tokens: m.processed_system_tokens,
            original_total_tokens: m.original_total_tokens,
            processed_total_tokens: m.processed_total_tokens,
            ratio: m.total_ratio(),
        }
    }
}

pub struct ChatRecordBuilder {
    record: ChatRecord,
    started_at: std::time::Instant,
}

impl ChatRecordBuilder {
    pub fn new(identity: &Identity, request_id: &str, model_requested: &str, prompt_mode: &str) -> Self {
        Self {
            record: ChatRecord {
                request_id: request_id.to_string(),
                identity_user_name: identity.user_name.clone(),
                identity_client_id: identity.client_id.clone(),
                timestamp_unix: now_unix(),
                model_requested: model_requested.to_string(),
                model_selected: None,
                prompt_mode: prompt_mode.to_string(),
                token_metrics: TokenMetricsRecord::default(),
                is_prompt_proceed: false,
                is_compressed: false,
                latency: LatencyMetrics::default(),
                tool_calls: Vec::new(),
                original_messages_json: String::new(),
                processed_messages_json: String::new(),
                final_response_excerpt: String::new(),
                response_headers: Vec::new(),
                upstream_usage: None,
                classification_category: None,
                errors: Vec::new(),
            },
            started_at: std::time::Instant::now(),
        }
    }

    pub fn model_selected(&mut self, model: impl Into<String>) -> &mut Self {
        self.record.model_selected = Some(model.into());
        self
    }

    pub fn token_metrics(&mut self, metrics: &TokenMetrics) -> &mut Self {
        self.record.token_metrics = metrics.into();
        self.record.is_prompt_proceed = true;
        self
    }

    pub fn tool_calls(&mut self, calls: Vec<ToolCallRecord>) -> &mut Self {
        self.record.tool_calls = calls;
        self
    }

    pub fn final_response_excerpt(&mut self, text: &str) -> &mut Self {
        self.record.final_response_excerpt = text.chars().take(4096).collect();
        self
    }

    pub fn error(&mut self, err: &ChatError) -> &mut Self {
        self.record.errors.push(err.to_string());
        self
    }

    pub fn main_model_latency(&mut self, d: Duration) -> &mut Self {
        self.record.latency.main_model_ms = d.as_millis() as u64;
        self
    }

    pub fn build(mut self) -> ChatRecord {
        self.record.latency.total_ms = self.started_at.elapsed().as_millis() as u64;
        self.record
    }
}

fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
