//! Inbound/outbound JSON DTOs for `POST /v1/chat/completions` (§6).

use gateway_core::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamOptions {
    #[serde(default)]
    pub include_usage: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtraBody {
    #[serde(default)]
    pub prompt_mode: config::PromptMode,
}

/// Top-level chat-completions request. Unknown sibling fields are forwarded
/// verbatim to the upstream call (§6: "plus any additional top-level fields").
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub stream_options: StreamOptions,
    #[serde(default)]
    pub extra_body: ExtraBody,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionResponseChoice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Non-streaming response shape, mirroring OpenAI's `chat.completion` object.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatCompletionResponseChoice>,
    pub usage: ResponseUsage,
}

impl ChatCompletionResponse {
    pub fn single(id: String, created: u64, model: String, content: String, usage: ResponseUsage) -> Self {
        Self {
            id,
            object: "chat.completion",
            created,
            model,
            choices: vec![ChatCompletionResponseChoice {
                index: 0,
                message: ResponseMessage { role: "assistant", content },
                finish_reason: "stop",
            }],
            usage,
        }
    }
}
