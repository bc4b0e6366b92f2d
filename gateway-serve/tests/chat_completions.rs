//! End-to-end HTTP tests: bind to `127.0.0.1:0`, drive the real axum `Router`
//! with `reqwest`, and swap in `MockLlm` for the upstream call. Grounded on
//! the teacher's `run_serve_on_listener`-against-an-ephemeral-port pattern
//! for its own websocket tests.

use std::sync::Arc;
use std::sync::OnceLock;

use gateway_core::llm::mock::MockLlm;
use gateway_core::llm::{LlmClient, LlmResponse};
use gateway_core::log_sink::{LogDispatcher, NullLogSink};
use gateway_core::orchestrator::tool_status::InMemoryToolStatusStore;
use gateway_serve::AppState;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

fn metrics_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("install prometheus recorder once for the test binary")
        })
        .clone()
}

fn test_config() -> config::GatewayConfig {
    let yaml = r#"
llm:
  llm_endpoint: "http://127.0.0.1:9/unused"
"#;
    serde_yaml::from_str(yaml).unwrap()
}

async fn spawn_app(llm: Arc<MockLlm>) -> (String, CancellationToken) {
    let cancel = CancellationToken::new();
    let tool_status = Arc::new(InMemoryToolStatusStore::new());
    let log_dispatcher = LogDispatcher::spawn(Arc::new(NullLogSink), 64, cancel.clone());

    let state = Arc::new(AppState::new(
        test_config(),
        config::ConfigDomains::default(),
        reqwest::Client::new(),
        llm.clone() as Arc<dyn LlmClient>,
        llm as Arc<dyn LlmClient>,
        tool_status,
        log_dispatcher,
        metrics_handle(),
        cancel.clone(),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let run_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = gateway_serve::run_serve_on_listener(listener, state, run_cancel).await;
    });

    (format!("http://{addr}"), cancel)
}

#[tokio::test]
async fn non_streaming_completion_returns_chat_completion_object() {
    let mock = Arc::new(MockLlm::new());
    mock.push_response(LlmResponse {
        content: "hi there".to_string(),
        prompt_tokens: 10,
        completion_tokens: 2,
    });
    let (base, cancel) = spawn_app(mock).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/chat-rag/api/v1/chat/completions"))
        .header("x-request-id", uuid::Uuid::now_v7().to_string())
        .json(&serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "hello"}],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["choices"][0]["message"]["content"], "hi there");
    assert_eq!(body["usage"]["total_tokens"], 12);

    cancel.cancel();
}

#[tokio::test]
async fn missing_request_id_is_rejected_before_touching_the_model() {
    let mock = Arc::new(MockLlm::new());
    let (base, cancel) = spawn_app(mock).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/chat-rag/api/v1/chat/completions"))
        .json(&serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "hello"}],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "chat-rag.invalid_request");

    cancel.cancel();
}

#[tokio::test]
async fn streaming_completion_emits_sse_frames_ending_in_done() {
    let mock = Arc::new(MockLlm::new());
    mock.push_stream(vec!["hel", "lo", "[DONE]"]);
    let (base, cancel) = spawn_app(mock).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/chat-rag/api/v1/chat/completions"))
        .header("x-request-id", uuid::Uuid::now_v7().to_string())
        .json(&serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "hello"}],
            "stream": true,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/event-stream; charset=utf-8"
    );
    let text = resp.text().await.unwrap();
    assert!(text.contains("data: [DONE]"));

    cancel.cancel();
}

#[tokio::test]
async fn tool_status_endpoint_returns_empty_list_for_unknown_request() {
    let mock = Arc::new(MockLlm::new());
    let (base, cancel) = spawn_app(mock).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{base}/chat-rag/api/v1/chat/requests/not-a-real-id/status"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["requestId"], "not-a-real-id");
    assert!(body["tools"].as_array().unwrap().is_empty());

    cancel.cancel();
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text_format() {
    let mock = Arc::new(MockLlm::new());
    let (base, cancel) = spawn_app(mock).await;

    let client = reqwest::Client::new();
    let resp = client.get(format!("{base}/metrics")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let text = resp.text().await.unwrap();
    assert!(text.contains("dropped_log_records"));

    cancel.cancel();
}
