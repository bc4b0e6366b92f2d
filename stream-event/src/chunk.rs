//! OpenAI-compatible chat-completion streaming chunk DTOs.
//!
//! Field names and shapes match the [OpenAI streaming chat completions
//! format](https://platform.openai.com/docs/api-reference/chat-streaming) so
//! that any OpenAI-compatible client can consume our SSE body unmodified.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Metadata shared by every chunk in one turn (same id, created, model).
#[derive(Debug, Clone)]
pub struct TurnMeta {
    /// Completion id (e.g. `"chatcmpl-xxx"`), stable across all chunks of one HTTP response.
    pub id: String,
    /// Model name to echo in chunks (the resolved model, not necessarily the caller's `"auto"`).
    pub model: String,
    /// Unix timestamp (seconds). Resolved lazily on first use via [`TurnMeta::created_secs`].
    pub created: Option<u64>,
}

impl TurnMeta {
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            created: None,
        }
    }

    /// Resolves the created timestamp, caching it on first call so every chunk in a
    /// turn reports the same value.
    pub fn created_secs(&mut self) -> u64 {
        if let Some(c) = self.created {
            return c;
        }
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.created = Some(secs);
        secs
    }
}

/// One SSE chunk of a streamed chat completion.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChunkUsage>,
}

impl ChatCompletionChunk {
    pub const OBJECT: &'static str = "chat.completion.chunk";
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct Delta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<DeltaToolCall>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeltaToolCall {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<DeltaToolCallFunction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeltaToolCallFunction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChunkUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
