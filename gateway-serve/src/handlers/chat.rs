//! `POST /v1/chat/completions` (§6): the gateway's one hot-path handler —
//! identity, prompt pipeline, routing, upstream call, and (for `stream:true`)
//! the tool-call orchestrator.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::warn;

use gateway_core::error::{ApiErrorBody, ChatError};
use gateway_core::llm::LlmRequest;
use gateway_core::orchestrator::{run_stream, ChunkSender, OrchestratorContext};
use gateway_core::prompt::{arrange, PromptValue, UserMsgFilter};
use gateway_core::record::ChatRecordBuilder;
use gateway_core::router::semantic::encode_user_input_header;

use crate::app::AppState;
use crate::identity_headers::identity_from_headers;
use crate::request::{ChatCompletionRequest, ChatCompletionResponse, ResponseUsage};
use crate::tools_build::build_tool_executor;

pub async fn completions(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    let identity = match identity_from_headers(&headers, &state.config.identity) {
        Ok(identity) => identity,
        Err(err) => return invalid_request(&err.to_string()),
    };

    let request: ChatCompletionRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(err) => return invalid_request(&format!("invalid request body: {err}")),
    };

    let domains = state.config_store.snapshot().await;
    let tool_executor = Arc::new(build_tool_executor(&domains.precise_context, state.http.clone(), identity.clone()));
    let ready_tools = tool_executor.ready_tool_descriptors().await;

    let prompt_value = PromptValue::from_messages(request.messages.clone());
    let mode = request.extra_body.prompt_mode;
    let rules_injector = state.rules_injector(&domains);
    let user_msg_filter = UserMsgFilter::new(domains.tools_prompt.dedupe_environment_details);

    let processed = arrange(
        prompt_value,
        mode,
        Some(&rules_injector),
        &user_msg_filter,
        &domains.tools_prompt.agent_matchers,
        &ready_tools,
        domains.tools_prompt.tool_use_rules_block.as_deref(),
    );

    let mut record = ChatRecordBuilder::new(&identity, &identity.request_id, &request.model, mode_label(mode));
    record.token_metrics(&processed.metrics);

    let (selected, candidates, x_select_llm, x_user_input) = if request.model == "auto" {
        let Some(strategy) = state.router_cache.get(&domains).await else {
            return server_error("model router is not configured");
        };
        match strategy.select(&processed.messages).await {
            Ok(result) => {
                let header_input = result.classification_input.as_deref().map(encode_user_input_header);
                (result.selected.clone(), result.candidates, Some(result.selected), header_input)
            }
            Err(err) => {
                record.error(&err);
                state.log_dispatcher.dispatch(record.build());
                return error_response(&err);
            }
        }
    } else {
        (request.model.clone(), vec![request.model.clone()], None, None)
    };
    record.model_selected(&selected);

    if request.stream {
        stream_response(state, identity, processed.messages, tool_executor, selected, candidates, x_select_llm, x_user_input, record)
    } else {
        non_stream_response(state, identity, processed.messages, selected, candidates, x_select_llm, x_user_input, record).await
    }
}

async fn non_stream_response(
    state: Arc<AppState>,
    identity: gateway_core::identity::Identity,
    messages: Vec<gateway_core::message::Message>,
    selected: String,
    candidates: Vec<String>,
    x_select_llm: Option<String>,
    x_user_input: Option<String>,
    mut record: ChatRecordBuilder,
) -> Response {
    let started = std::time::Instant::now();
    let llm_request = LlmRequest {
        model: selected.clone(),
        messages,
        candidates,
        request_id: Some(identity.request_id.clone()),
    };
    let result = state.llm.call(llm_request).await;
    record.main_model_latency(started.elapsed());

    match result {
        Ok(response) => {
            record.final_response_excerpt(&response.content);
            state.log_dispatcher.dispatch(record.build());

            let body = ChatCompletionResponse::single(
                format!("chatcmpl-{}", identity.request_id),
                now_unix(),
                selected,
                response.content,
                ResponseUsage {
                    prompt_tokens: response.prompt_tokens,
                    completion_tokens: response.completion_tokens,
                    total_tokens: response.prompt_tokens + response.completion_tokens,
                },
            );
            let mut resp = axum::Json(body).into_response();
            apply_select_headers(resp.headers_mut(), x_select_llm, x_user_input);
            resp
        }
        Err(err) => {
            record.error(&err);
            state.log_dispatcher.dispatch(record.build());
            error_response(&err)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn stream_response(
    state: Arc<AppState>,
    identity: gateway_core::identity::Identity,
    messages: Vec<gateway_core::message::Message>,
    tool_executor: Arc<gateway_core::tools::ToolExecutor>,
    selected: String,
    candidates: Vec<String>,
    x_select_llm: Option<String>,
    x_user_input: Option<String>,
    mut record: ChatRecordBuilder,
) -> Response {
    let (tx, rx): (ChunkSender, mpsc::Receiver<String>) = mpsc::channel(64);
    let tool_names = tool_executor.tool_names();
    let request_id = identity.request_id.clone();

    let ctx = OrchestratorContext {
        llm: state.llm.clone(),
        tools: tool_executor,
        tool_status: state.tool_status.clone(),
        request_id: request_id.clone(),
        model: selected.clone(),
        candidates,
        tool_names,
        include_usage: false,
        turn_id: format!("chatcmpl-{request_id}"),
        turn_model: selected,
        turn_created: now_unix(),
    };

    let error_tx = tx.clone();
    let log_dispatcher = state.log_dispatcher.clone();
    tokio::spawn(async move {
        let started = std::time::Instant::now();
        match run_stream(&ctx, messages, tx).await {
            Ok(outcome) => {
                record.main_model_latency(started.elapsed());
                record.final_response_excerpt(&outcome.full_content);
                record.tool_calls(outcome.tool_calls);
                log_dispatcher.dispatch(record.build());
            }
            Err(err) => {
                warn!(request_id = %ctx.request_id, error = %err, "stream terminated with error");
                let line = stream_event::write_sse_error_line(
                    &serde_json::to_value(err.to_api_error()).unwrap_or_default(),
                );
                let _ = error_tx.send(line).await;
                let _ = error_tx.send(stream_event::DONE_LINE.to_string()).await;
                record.error(&err);
                log_dispatcher.dispatch(record.build());
            }
        }
    });

    let body = Body::from_stream(ReceiverStream::new(rx).map(|line| Ok::<_, std::convert::Infallible>(line)));
    let mut resp = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("x-accel-buffering", "no")
        .body(body)
        .expect("static headers are always valid");
    apply_select_headers(resp.headers_mut(), x_select_llm, x_user_input);
    resp
}

fn apply_select_headers(headers: &mut HeaderMap, x_select_llm: Option<String>, x_user_input: Option<String>) {
    if let Some(model) = x_select_llm {
        if let Ok(value) = HeaderValue::from_str(&model) {
            headers.insert("x-select-llm", value);
        }
    }
    if let Some(input) = x_user_input {
        if let Ok(value) = HeaderValue::from_str(&input) {
            headers.insert("x-user-input", value);
        }
    }
}

fn mode_label(mode: config::PromptMode) -> &'static str {
    match mode {
        config::PromptMode::Raw => "raw",
        config::PromptMode::Balanced => "balanced",
        config::PromptMode::Cost => "cost",
        config::PromptMode::Performance => "performance",
        config::PromptMode::Auto => "auto",
        config::PromptMode::Strict => "strict",
    }
}

fn invalid_request(message: &str) -> Response {
    let body = ApiErrorBody {
        code: "chat-rag.invalid_request".to_string(),
        message: message.to_string(),
        success: false,
        status_code: Some(400),
        error_type: Some("api_error".to_string()),
    };
    (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
}

fn server_error(message: &str) -> Response {
    let body = ApiErrorBody {
        code: "chat-rag.server_error".to_string(),
        message: message.to_string(),
        success: false,
        status_code: Some(500),
        error_type: Some("api_error".to_string()),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
}

fn error_response(err: &ChatError) -> Response {
    let body = err.to_api_error();
    let status = body
        .status_code
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(body)).into_response()
}

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}
