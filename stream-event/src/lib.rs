//! Wire-level types shared between the gateway core and the HTTP layer.
//!
//! This crate defines the OpenAI-compatible chat-completion chunk shape, the
//! SSE line writer, and the tool-status side-channel event. It does not depend
//! on `gateway-core`: the core builds these values and the HTTP layer (or a
//! status-poll handler) serializes/reads them.

pub mod chunk;
pub mod status;

pub use chunk::{
    ChatCompletionChunk, ChunkChoice, ChunkUsage, Delta, DeltaToolCall, DeltaToolCallFunction,
    TurnMeta,
};
pub use status::{ToolStatus, ToolStatusEvent};

/// Serializes a [`ChatCompletionChunk`] to a single SSE line: `data: <JSON>\n\n`.
pub fn write_sse_line(chunk: &ChatCompletionChunk) -> String {
    let json = serde_json::to_string(chunk).expect("chunk serialization is infallible");
    format!("data: {json}\n\n")
}

/// The terminal SSE frame every stream ends with, exactly once.
pub const DONE_LINE: &str = "data: [DONE]\n\n";

/// Writes an arbitrary JSON value as a mid-stream SSE error frame (`{"error": ...}`),
/// still followed by [`DONE_LINE`] per the outward contract.
pub fn write_sse_error_line(error: &serde_json::Value) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "error": error })
    )
}
