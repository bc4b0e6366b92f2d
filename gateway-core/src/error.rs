//! The `ChatError` taxonomy (§7) and its conversion to the outward API error envelope.
//!
//! Grounded on the teacher's `RunError`/`CompilationError` enums: one `thiserror`
//! variant per taxonomy entry, `#[from]` where a lower-level error naturally maps up.

use serde::Serialize;
use thiserror::Error;

/// Taxonomy entry, independent of transport-level status. Carried on `ChatRecord.errors`.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("semantic pipeline call failed: {0}")]
    Semantic(String),

    #[error("summary/analyzer call failed: {0}")]
    Summary(String),

    #[error("upstream llm returned an error: {0}")]
    Api(String),

    #[error("upstream rejected the request for context length")]
    ContextLengthExceeded,

    #[error("internal server error: {0}")]
    Server(String),

    #[error("secondary failure: {0}")]
    Extra(String),

    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ChatError {
    /// Whether a 4xx body should be reclassified as context-length before this
    /// variant is ever constructed. See [`classify_upstream_error`].
    pub fn is_context_length(&self) -> bool {
        matches!(self, ChatError::ContextLengthExceeded)
    }

    pub fn to_api_error(&self) -> ApiErrorBody {
        match self {
            ChatError::ContextLengthExceeded => ApiErrorBody {
                code: "chat-rag.context_length_exceeded".to_string(),
                message: "The conversation is too long for this model; reduce the length and try again.".to_string(),
                success: false,
                status_code: Some(400),
                error_type: Some("api_error".to_string()),
            },
            ChatError::Api(msg) => ApiErrorBody {
                code: "chat-rag.model_service_unavailable".to_string(),
                message: msg.clone(),
                success: false,
                status_code: Some(503),
                error_type: Some("api_error".to_string()),
            },
            ChatError::Transport(err) => ApiErrorBody {
                code: "chat-rag.model_service_unavailable".to_string(),
                message: err.to_string(),
                success: false,
                status_code: Some(503),
                error_type: Some("api_error".to_string()),
            },
            ChatError::Semantic(msg) | ChatError::Summary(msg) | ChatError::Extra(msg) => ApiErrorBody {
                code: "chat-rag.secondary_failure".to_string(),
                message: msg.clone(),
                success: false,
                status_code: None,
                error_type: Some("api_error".to_string()),
            },
            ChatError::Server(msg) => ApiErrorBody {
                code: "chat-rag.server_error".to_string(),
                message: msg.clone(),
                success: false,
                status_code: Some(500),
                error_type: Some("api_error".to_string()),
            },
            ChatError::Config(err) => ApiErrorBody {
                code: "chat-rag.server_error".to_string(),
                message: err.to_string(),
                success: false,
                status_code: Some(500),
                error_type: Some("api_error".to_string()),
            },
        }
    }
}

/// `{code, message, success:false, statusCode?, type?}` envelope used both for
/// the non-stream JSON error body and the mid-stream SSE error frame.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    pub success: bool,
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/// Classifies a 4xx upstream body per §5: bodies mentioning "maximum context
/// length" or "Input text is too long" are context-length errors that skip
/// both retry and router degradation.
pub fn classify_upstream_error(status: u16, body: &str) -> ChatError {
    if status >= 400 && status < 500 {
        if body.contains("maximum context length") || body.contains("Input text is too long") {
            return ChatError::ContextLengthExceeded;
        }
    }
    ChatError::Api(format!("upstream returned HTTP {status}: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maximum_context_length_body() {
        let err = classify_upstream_error(400, r#"{"error":{"message":"This model's maximum context length is 8192"}}"#);
        assert!(matches!(err, ChatError::ContextLengthExceeded));
    }

    #[test]
    fn classify_input_too_long_body() {
        let err = classify_upstream_error(400, "Input text is too long for this model");
        assert!(matches!(err, ChatError::ContextLengthExceeded));
    }

    #[test]
    fn classify_other_4xx_as_api_error() {
        let err = classify_upstream_error(401, "unauthorized");
        assert!(matches!(err, ChatError::Api(_)));
    }

    #[test]
    fn context_length_exceeded_maps_to_400_envelope() {
        let body = ChatError::ContextLengthExceeded.to_api_error();
        assert_eq!(body.code, "chat-rag.context_length_exceeded");
        assert_eq!(body.status_code, Some(400));
        assert!(!body.success);
    }

    #[test]
    fn api_error_maps_to_503_envelope() {
        let body = ChatError::Api("boom".to_string()).to_api_error();
        assert_eq!(body.code, "chat-rag.model_service_unavailable");
        assert_eq!(body.status_code, Some(503));
    }
}
