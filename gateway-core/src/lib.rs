//! # gateway-core
//!
//! The message model, Prompt-Flow Pipeline, Streaming Tool-Call Orchestrator,
//! Model Router, upstream LLM client, external tool clients, request log
//! record and async dispatch, and the error taxonomy for the chat-rag
//! gateway.
//!
//! ## Main modules
//!
//! - [`message`]: [`message::Message`], [`message::Content`] — the polymorphic chat message model.
//! - [`identity`]: [`identity::Identity`] — request identity extracted from inbound headers.
//! - [`prompt`]: [`prompt::arrange`], [`prompt::PromptValue`], [`prompt::ProcessedPrompt`] — the prompt pipeline.
//! - [`orchestrator`]: [`orchestrator::run_stream`] — the streaming tool-call orchestrator.
//! - [`router`]: [`router::RouterStrategy`], [`router::SemanticRouter`], [`router::PriorityRouter`] — model selection.
//! - [`tools`]: [`tools::Tool`], [`tools::ToolExecutor`], [`tools::RagToolClient`] — server-side tool execution.
//! - [`llm`]: [`llm::LlmClient`], [`llm::HttpLlmClient`], [`llm::MockLlm`] — the upstream LLM client.
//! - [`record`]: [`record::ChatRecord`], [`record::ChatRecordBuilder`] — the per-request structured log record.
//! - [`log_sink`]: [`log_sink::LogSink`], [`log_sink::LogDispatcher`] — async log dispatch.
//! - [`error`]: [`error::ChatError`] — the error taxonomy and API error envelope.

pub mod error;
pub mod identity;
pub mod llm;
pub mod log_sink;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod record;
pub mod router;
pub mod tools;
