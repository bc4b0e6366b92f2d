//! Upstream LLM Client (§4.5). Grounded on the teacher's `LlmClient` trait
//! (`invoke`/`invoke_stream`) in `llm/mod.rs`: kept as an `async_trait`, with
//! a default streaming method that degrades to "call once, replay as a
//! single chunk" for implementors that only support the non-streaming path
//! (used by tests and [`MockLlm`]).

pub mod http;
pub mod mock;
pub mod sse;

pub use http::{HttpLlmClient, LlmClientConfig};
pub use mock::MockLlm;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ChatError;
use crate::message::Message;

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub messages: Vec<Message>,
    /// Degradation-ordered candidate list from the router (§4.3); `[model]`
    /// when the caller did not request `auto`.
    pub candidates: Vec<String>,
    /// Propagated to the upstream call as `x-request-id` unchanged (§6, §8 property 8).
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// One parsed SSE frame from the upstream body (§4.2 Algorithm step 1).
#[derive(Debug, Clone)]
pub enum SseFrame {
    Content(String),
    Usage { prompt: usize, completion: usize },
    Done,
}

pub type SseReceiver = mpsc::Receiver<Result<SseFrame, ChatError>>;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Non-streaming call: iterates `request.candidates` in order per the
    /// router degradation contract, applying the idle-timeout/retry budget
    /// to each before moving to the next (§4.5, §5).
    async fn call(&self, request: LlmRequest) -> Result<LlmResponse, ChatError>;

    /// Streaming call. Default implementation degrades to [`Self::call`] and
    /// replays the whole response as one `SseFrame::Content` followed by
    /// `SseFrame::Done` — suitable for a client that only implements the
    /// non-streaming path.
    async fn stream(&self, request: LlmRequest) -> Result<SseReceiver, ChatError> {
        let response = self.call(request).await?;
        let (tx, rx) = mpsc::channel(4);
        let _ = tx.send(Ok(SseFrame::Content(response.content))).await;
        let _ = tx
            .send(Ok(SseFrame::Usage {
                prompt: response.prompt_tokens as usize,
                completion: response.completion_tokens as usize,
            }))
            .await;
        let _ = tx.send(Ok(SseFrame::Done)).await;
        Ok(rx)
    }
}
