//! `HttpLlmClient`: the production `LlmClient` implementation (§4.5).
//!
//! Retry/idle-timeout semantics exactly as specified in §5: `idle_timeout_ms`
//! reset on every received byte, `total_idle_timeout_ms` budget across
//! retries, `max_retry_count` attempts spaced `retry_interval_ms` apart,
//! retried only for timeout/transport errors. The router degradation path
//! (iterating `request.candidates`) wraps this per-candidate retry loop.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{classify_upstream_error, ChatError};

use super::sse::parse_line;
use super::{LlmClient, LlmRequest, LlmResponse, SseFrame, SseReceiver};

#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub idle_timeout: Duration,
    pub total_idle_timeout: Duration,
    pub max_retry_count: u32,
    pub retry_interval: Duration,
}

impl From<&config::LlmClientConfig> for LlmClientConfig {
    fn from(c: &config::LlmClientConfig) -> Self {
        Self {
            endpoint: c.llm_endpoint.clone(),
            token: c.llm_token.clone(),
            idle_timeout: Duration::from_millis(c.idle_timeout_ms),
            total_idle_timeout: Duration::from_millis(c.total_idle_timeout_ms),
            max_retry_count: c.max_retry_count,
            retry_interval: Duration::from_millis(c.retry_interval_ms),
        }
    }
}

/// Shares one pooled `reqwest::Client` across all calls, mirroring the
/// teacher's `WebToolsSource::with_client` injection pattern.
pub struct HttpLlmClient {
    http: reqwest::Client,
    config: LlmClientConfig,
}

impl HttpLlmClient {
    pub fn new(http: reqwest::Client, config: LlmClientConfig) -> Self {
        Self { http, config }
    }

    fn build_request(&self, request: &LlmRequest, model: &str, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": model,
            "messages": request.messages,
            "stream": stream,
        })
    }

    async fn call_once(&self, body: &serde_json::Value, request_id: Option<&str>) -> Result<LlmResponse, ChatError> {
        let mut req = self.http.post(&self.config.endpoint).json(body);
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }
        if let Some(id) = request_id {
            req = req.header("x-request-id", id);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_upstream_error(status.as_u16(), &text));
        }
        let value: serde_json::Value = resp.json().await?;
        let content = value["choices"][0]["message"]["content"].as_str().unwrap_or("").to_string();
        let prompt_tokens = value["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32;
        let completion_tokens = value["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32;
        Ok(LlmResponse {
            content,
            prompt_tokens,
            completion_tokens,
        })
    }

    /// Retries `call_once` up to `max_retry_count` additional times, spaced
    /// `retry_interval`, bounded by `total_idle_timeout`. Never retries a
    /// `ContextLengthExceeded` or other 4xx-derived error.
    async fn call_with_retry(&self, body: &serde_json::Value, request_id: Option<&str>) -> Result<LlmResponse, ChatError> {
        let deadline = tokio::time::Instant::now() + self.config.total_idle_timeout;
        let mut attempt = 0u32;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let attempt_budget = remaining.min(self.config.idle_timeout);
            match tokio::time::timeout(attempt_budget, self.call_once(body, request_id)).await {
                Ok(Ok(resp)) => return Ok(resp),
                Ok(Err(err)) if !is_retryable(&err) => return Err(err),
                Ok(Err(err)) if attempt >= self.config.max_retry_count => return Err(err),
                Err(_) if attempt >= self.config.max_retry_count => {
                    return Err(ChatError::Api("upstream call timed out".to_string()))
                }
                _ => {
                    attempt += 1;
                    warn!(attempt, "retrying upstream llm call");
                    tokio::time::sleep(self.config.retry_interval).await;
                }
            }
        }
    }
}

fn is_retryable(err: &ChatError) -> bool {
    matches!(err, ChatError::Transport(_))
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn call(&self, request: LlmRequest) -> Result<LlmResponse, ChatError> {
        let mut last_err = None;
        for model in &request.candidates {
            let body = self.build_request(&request, model, false);
            match self.call_with_retry(&body, request.request_id.as_deref()).await {
                Ok(resp) => return Ok(resp),
                Err(err) if err.is_context_length() => return Err(err),
                Err(err) => {
                    warn!(model, "candidate failed, trying next");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ChatError::Server("no candidates configured".to_string())))
    }

    async fn stream(&self, request: LlmRequest) -> Result<SseReceiver, ChatError> {
        for model in &request.candidates {
            let body = self.build_request(&request, model, true);
            let mut req = self.http.post(&self.config.endpoint).json(&body);
            if let Some(token) = &self.config.token {
                req = req.bearer_auth(token);
            }
            if let Some(id) = &request.request_id {
                req = req.header("x-request-id", id);
            }
            let resp = match req.send().await {
                Ok(r) => r,
                Err(err) => {
                    warn!(model, "candidate connect failed, trying next");
                    let _ = err;
                    continue;
                }
            };
            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                let err = classify_upstream_error(status.as_u16(), &text);
                if err.is_context_length() {
                    return Err(err);
                }
                continue;
            }

            info!(model, "streaming from upstream candidate");
            let (tx, rx) = mpsc::channel(64);
            let idle_timeout = self.config.idle_timeout;
            tokio::spawn(pump_sse_body(resp, tx, idle_timeout));
            return Ok(rx);
        }
        Err(ChatError::Server("all candidates failed to connect".to_string()))
    }
}

/// Reads the upstream byte stream line-by-line, resetting the idle timer on
/// every received chunk, forwarding parsed frames to `tx`.
async fn pump_sse_body(resp: reqwest::Response, tx: mpsc::Sender<Result<SseFrame, ChatError>>, idle_timeout: Duration) {
    let mut byte_stream = resp.bytes_stream();
    let mut buffer = String::new();
    loop {
        let next = tokio::time::timeout(idle_timeout, byte_stream.next()).await;
        let chunk = match next {
            Ok(Some(Ok(bytes))) => bytes,
            Ok(Some(Err(err))) => {
                let _ = tx.send(Err(ChatError::Transport(err))).await;
                return;
            }
            Ok(None) => break,
            Err(_) => {
                let _ = tx.send(Err(ChatError::Api("upstream stream idle timeout".to_string()))).await;
                return;
            }
        };
        buffer.push_str(&String::from_utf8_lossy(&chunk));
        while let Some(pos) = buffer.find('\n') {
            let line = buffer[..pos].to_string();
            buffer.drain(..=pos);
            if let Some(parsed) = parse_line(&line) {
                match parsed {
                    Ok(frame) => {
                        let is_done = matches!(frame, SseFrame::Done);
                        if tx.send(Ok(frame)).await.is_err() {
                            return;
                        }
                        if is_done {
                            return;
                        }
                    }
                    Err(msg) => {
                        let _ = tx.send(Err(ChatError::Api(msg))).await;
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_retryable_rejects_context_length() {
        assert!(!is_retryable(&ChatError::ContextLengthExceeded));
    }

    #[test]
    fn is_retryable_rejects_api_error() {
        assert!(!is_retryable(&ChatError::Api("boom".to_string())));
    }
}
