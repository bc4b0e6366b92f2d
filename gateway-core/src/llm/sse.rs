//! Parses raw upstream `data: ...` SSE lines into [`super::SseFrame`]s.
//! Grounded on the teacher's `openai_sse` line-handling shape (a `data:`
//! frame carries a JSON delta, `[DONE]` terminates the stream).

use serde_json::Value;

use super::SseFrame;

/// Parses one raw line (without the trailing newline) from an upstream SSE
/// body. Lines that are not `data:` frames (blank keep-alive lines, SSE
/// comments) yield `None` and should be skipped by the caller.
pub fn parse_line(line: &str) -> Option<Result<SseFrame, String>> {
    let line = line.trim_end_matches('\r');
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }
    if payload == "[DONE]" {
        return Some(Ok(SseFrame::Done));
    }

    let value: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => return Some(Err(format!("invalid SSE json payload: {e}"))),
    };

    if let Some(usage) = value.get("usage") {
        if let (Some(prompt), Some(completion)) = (
            usage.get("prompt_tokens").and_then(Value::as_u64),
            usage.get("completion_tokens").and_then(Value::as_u64),
        ) {
            return Some(Ok(SseFrame::Usage {
                prompt: prompt as usize,
                completion: completion as usize,
            }));
        }
    }

    let delta_text = value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(Value::as_str)
        .unwrap_or("");

    Some(Ok(SseFrame::Content(delta_text.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_done_sentinel() {
        assert!(matches!(parse_line("data: [DONE]"), Some(Ok(SseFrame::Done))));
    }

    #[test]
    fn parses_content_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"hi"}}]}"#;
        match parse_line(line) {
            Some(Ok(SseFrame::Content(text))) => assert_eq!(text, "hi"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_usage_frame() {
        let line = r#"data: {"usage":{"prompt_tokens":10,"completion_tokens":5}}"#;
        match parse_line(line) {
            Some(Ok(SseFrame::Usage { prompt, completion })) => {
                assert_eq!(prompt, 10);
                assert_eq!(completion, 5);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_data_line_is_skipped() {
        assert!(parse_line(": keep-alive").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(parse_line("data: not json"), Some(Err(_))));
    }
}
