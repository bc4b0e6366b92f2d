//! The Streaming Tool-Call Orchestrator (§4.2): detects `<tool_name>...</tool_name>`
//! spans inside a live SSE token stream, suspends the stream, executes the
//! tool, and re-enters the LLM with synthetic assistant/user messages.
//!
//! Implemented as an iterative loop over `(messages, depth)` rather than
//! actual recursion (§9 design note: "an iterative loop ... is preferable to
//! actual recursion").

pub mod tool_status;
pub mod window;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::ChatError;
use crate::llm::{LlmClient, LlmRequest, SseFrame};
use crate::message::{Content, ContentPart, Message, Role};
use crate::record::{ToolCallRecord, ToolResultStatus};
use crate::tools::ToolExecutor;
use tool_status::{ToolRunStatus, ToolStatusStore};
use window::Window;

pub const MAX_TOOL_CALL_DEPTH: u32 = 10;

const POST_TOOL_SUMMARY_DIRECTIVE: &str =
    "Summarize the result above within <thinking> tags and prefer the named tools on the next turn if further lookups are needed.";

/// Sink the orchestrator writes already-framed `data: ...\n\n` SSE lines to.
/// Grounded on the teacher's `mpsc::Sender<MessageChunk>` used by
/// `invoke_stream` in `llm/mod.rs`.
pub type ChunkSender = mpsc::Sender<String>;

pub struct OrchestratorContext {
    pub llm: Arc<dyn LlmClient>,
    pub tools: Arc<ToolExecutor>,
    pub tool_status: Arc<dyn ToolStatusStore>,
    pub request_id: String,
    pub model: String,
    pub candidates: Vec<String>,
    pub tool_names: Vec<String>,
    pub include_usage: bool,
    /// Resolved once per HTTP response (id/model/created shared by every
    /// chunk); `stream_event::TurnMeta::created_secs` is resolved by the
    /// caller before constructing this context.
    pub turn_id: String,
    pub turn_model: String,
    pub turn_created: u64,
}

#[derive(Debug, Default)]
pub struct TurnOutcome {
    pub full_content: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Runs the streaming orchestration loop for one request, writing SSE frames
/// to `sender` until the final `[DONE]` sentinel, which is always written
/// exactly once (§8 property 5).
pub async fn run_stream(
    ctx: &OrchestratorContext,
    mut messages: Vec<Message>,
    sender: ChunkSender,
) -> Result<TurnOutcome, ChatError> {
    let mut depth = MAX_TOOL_CALL_DEPTH;
    let mut outcome = TurnOutcome::default();

    loop {
        let request = LlmRequest {
            model: ctx.model.clone(),
            messages: messages.clone(),
            candidates: ctx.candidates.clone(),
            request_id: Some(ctx.request_id.clone()),
        };
        let mut stream = ctx.llm.stream(request).await?;

        let mut window = Window::new();
        let mut full_content = String::new();
        let mut tool_detected: Option<String> = None;

        while let Some(frame) = stream.recv().await {
            match frame? {
                SseFrame::Usage { prompt, completion } => {
                    outcome.prompt_tokens = prompt;
                    outcome.completion_tokens = completion;
                }
                SseFrame::Content(delta) => {
                    full_content.push_str(&delta);
                    window.push(delta);

                    if tool_detected.is_none() && depth > 0 {
                        if let Some((name, pos)) = window::detect_tool_tag(&window.joined(), &ctx.tool_names) {
                            let joined = window.joined();
                            let prefix = joined[..pos].to_string();
                            if !prefix.is_empty() {
                                emit_text(&sender, ctx, &prefix).await;
                            }
                            let remainder = joined[pos..].to_string();
                            window.reset_to(remainder);
                            tool_detected = Some(name.to_string());
                        }
                    }

                    if tool_detected.is_none() && window.len() >= window::WINDOW_SIZE {
                        if let Some(chunk) = window.pop_front() {
                            emit_text(&sender, ctx, &chunk).await;
                        }
                    }
                }
                SseFrame::Done => break,
            }
        }

        match tool_detected {
            Some(tool_name) if depth > 0 => {
                let span = window.drain_joined();
                let tool_record = run_tool_with_filler(ctx, &sender, &tool_name, &span).await?;
                outcome.tool_calls.push(tool_record.clone());

                messages.push(Message::assistant(full_content.clone()));
                messages.push(build_tool_result_message(&tool_name, &tool_record));

                outcome.full_content.push_str(&full_content);
                depth -= 1;
                continue;
            }
            _ => {
                let remaining = window.drain_joined();
                if !remaining.is_empty() {
                    emit_text(&sender, ctx, &remaining).await;
                }
                outcome.full_content.push_str(&full_content);
                if outcome.completion_tokens == 0 {
                    outcome.completion_tokens = crate::prompt::token_count(&outcome.full_content);
                }
                let _ = sender.send(stream_event::DONE_LINE.to_string()).await;
                return Ok(outcome);
            }
        }
    }
}

async fn emit_text(sender: &ChunkSender, ctx: &OrchestratorContext, text: &str) {
    let chunk = stream_event::ChatCompletionChunk {
        id: ctx.turn_id.clone(),
        object: stream_event::ChatCompletionChunk::OBJECT,
        created: ctx.turn_created,
        model: ctx.turn_model.clone(),
        choices: vec![stream_event::ChunkChoice {
            index: 0,
            delta: stream_event::Delta {
                role: None,
                content: Some(text.to_string()),
                tool_calls: None,
            },
            finish_reason: None,
        }],
        usage: None,
    };
    let line = stream_event::write_sse_line(&chunk);
    if sender.send(line).await.is_err() {
        warn!(request_id = %ctx.request_id, "client disconnected mid-stream");
    }
}

/// Executes the tool while pacing keep-alive filler text on the outward
/// stream (§4.2, §5: at least one keep-alive chunk per second). Uses a
/// `tokio::time::interval` ticker raced against the tool future rather than a
/// fixed sleep loop (§4.2 Ambient addition).
async fn run_tool_with_filler(
    ctx: &OrchestratorContext,
    sender: &ChunkSender,
    tool_name: &str,
    span: &str,
) -> Result<ToolCallRecord, ChatError> {
    ctx.tool_status.set(&ctx.request_id, tool_name, ToolRunStatus::Running).await;
    emit_text(sender, ctx, &format!("\n#### \u{1f50d} {tool_name} \u{5de5}\u{5177}\u{68c0}\u{7d22}\u{4e2d}")).await;

    let started = Instant::now();
    let tool_future = ctx.tools.execute(tool_name, span);
    tokio::pin!(tool_future);

    let mut ticker = tokio::time::interval(Duration::from_millis(600));
    ticker.tick().await; // first tick fires immediately
    let mut pings = 0u32;
    let outcome = loop {
        tokio::select! {
            result = &mut tool_future => break result,
            _ = ticker.tick(), if pings < 5 => {
                emit_text(sender, ctx, ".").await;
                pings += 1;
            }
        }
    };
    let latency_ms = started.elapsed().as_millis() as u64;

    let (status, output, error_text) = match outcome {
        Ok(text) => {
            ctx.tool_status.set(&ctx.request_id, tool_name, ToolRunStatus::Success).await;
            (ToolResultStatus::Success, neutralize(&text), None)
        }
        Err(err) => {
            ctx.tool_status.set(&ctx.request_id, tool_name, ToolRunStatus::Failed).await;
            (ToolResultStatus::Failed, "did not find relevant results".to_string(), Some(err.to_string()))
        }
    };

    emit_text(sender, ctx, "\n#### \u{1f4a1} \u{68c0}\u{7d22}\u{5df2}\u{5b8c}\u{6210}\u{ff0c}\u{5206}\u{6790}\u{4e2d}...").await;
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        emit_text(sender, ctx, ".").await;
    }

    info!(tool = tool_name, latency_ms, status = ?status, "tool call completed");

    Ok(ToolCallRecord {
        tool_name: tool_name.to_string(),
        raw_input: span.to_string(),
        raw_output: output,
        status,
        latency_ms,
        error_text,
    })
}

/// Rewrites failure wording into neutral, user-visible language (§4.4, §7):
/// the literal words "failure"/"error"/"timeout" must never reach the model.
fn neutralize(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    if lower.contains("failure") || lower.contains("error") || lower.contains("timeout") {
        "did not find relevant results".to_string()
    } else {
        text.to_string()
    }
}

fn build_tool_result_message(tool_name: &str, record: &ToolCallRecord) -> Message {
    let parts = vec![
        ContentPart::text(format!("[{tool_name}] Result:")),
        ContentPart::text(record.raw_output.clone()),
        ContentPart::text(POST_TOOL_SUMMARY_DIRECTIVE),
    ];
    Message {
        role: Role::User,
        content: Some(Content::Parts(parts)),
        extra: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutralize_rewrites_failure_wording() {
        assert_eq!(neutralize("backend failure: connection reset"), "did not find relevant results");
        assert_eq!(neutralize("request timeout after 5s"), "did not find relevant results");
    }

    #[test]
    fn neutralize_passes_through_clean_text() {
        assert_eq!(neutralize("fn loginUser() { ... }"), "fn loginUser() { ... }");
    }

    #[test]
    fn build_tool_result_message_has_three_parts() {
        let record = ToolCallRecord {
            tool_name: "codebase_search".to_string(),
            raw_input: "<codebase_search/>".to_string(),
            raw_output: "fn loginUser()".to_string(),
            status: ToolResultStatus::Success,
            latency_ms: 10,
            error_text: None,
        };
        let msg = build_tool_result_message("codebase_search", &record);
        let Some(Content::Parts(parts)) = msg.content else {
            panic!("expected parts");
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].text.as_deref(), Some("[codebase_search] Result:"));
    }
}
