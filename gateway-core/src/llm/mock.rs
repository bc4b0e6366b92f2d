//! `MockLlm`: a scripted `LlmClient` for tests. Grounded on the teacher's
//! `StubLlm` test double in `llm/mod.rs` (a queue of canned responses
//! returned in order, panicking if exhausted).

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ChatError;

use super::{LlmClient, LlmRequest, LlmResponse, SseFrame, SseReceiver};

pub struct MockLlm {
    responses: Mutex<Vec<LlmResponse>>,
    stream_chunks: Mutex<Vec<Vec<String>>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            stream_chunks: Mutex::new(Vec::new()),
        }
    }

    pub fn push_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push(response);
    }

    /// Queues one streaming turn's worth of content chunks, delivered in
    /// order as `SseFrame::Content`, terminated by `SseFrame::Done`.
    pub fn push_stream(&self, chunks: Vec<&str>) {
        self.stream_chunks
            .lock()
            .unwrap()
            .push(chunks.into_iter().map(str::to_string).collect());
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn call(&self, _request: LlmRequest) -> Result<LlmResponse, ChatError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ChatError::Server("MockLlm has no queued response".to_string()));
        }
        Ok(responses.remove(0))
    }

    async fn stream(&self, _request: LlmRequest) -> Result<SseReceiver, ChatError> {
        let chunks = {
            let mut queued = self.stream_chunks.lock().unwrap();
            if queued.is_empty() {
                return Err(ChatError::Server("MockLlm has no queued stream".to_string()));
            }
            queued.remove(0)
        };
        let (tx, rx) = mpsc::channel(chunks.len() + 1);
        for chunk in chunks {
            if chunk == "[DONE]" {
                continue;
            }
            let _ = tx.send(Ok(SseFrame::Content(chunk))).await;
        }
        let _ = tx.send(Ok(SseFrame::Done)).await;
        Ok(rx)
    }
}
