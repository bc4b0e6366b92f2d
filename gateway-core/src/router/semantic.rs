//! Semantic strategy (§4.3 steps 1-7): classify the conversation with a small
//! analyzer LLM, score enabled candidates against the returned label.

use std::sync::Arc;

use base64::Engine;

use config::SemanticRouterConfig;

use crate::error::ChatError;
use crate::llm::{LlmClient, LlmRequest};
use crate::message::Message;

use super::RouteResult;

pub struct SemanticRouter {
    config: SemanticRouterConfig,
    analyzer: Arc<dyn LlmClient>,
}

impl SemanticRouter {
    pub fn new(config: SemanticRouterConfig, analyzer: Arc<dyn LlmClient>) -> Self {
        Self { config, analyzer }
    }

    /// Step 1: concatenate user-message content, optionally stripping fenced
    /// code blocks, capped at `max_user_messages` and `max_history_bytes`.
    pub fn extract_input(&self, messages: &[Message]) -> String {
        use crate::message::Role;
        let mut user_texts: Vec<String> = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.text())
            .collect();
        if user_texts.len() > self.config.max_user_messages {
            let skip = user_texts.len() - self.config.max_user_messages;
            user_texts.drain(..skip);
        }
        let mut joined = user_texts.join(&self.config.history_separator);
        if self.config.strip_code_blocks {
            joined = strip_fenced_code_blocks(&joined);
        }
        if joined.len() > self.config.max_history_bytes {
            joined.truncate(self.config.max_history_bytes);
        }
        joined
    }

    pub async fn select(&self, messages: &[Message]) -> Result<RouteResult, ChatError> {
        let input = self.extract_input(messages);
        let fallback = self
            .config
            .fallback_model_name
            .clone()
            .or_else(|| self.config.candidates.first().map(|c| c.model.clone()));

        let label = match self.classify(&input).await {
            Ok(label) => label,
            Err(_) => {
                let selected = fallback.ok_or_else(|| ChatError::Server("no candidates configured".to_string()))?;
                return Ok(RouteResult {
                    selected: selected.clone(),
                    candidates: vec![selected],
                    classification_input: Some(input),
                });
            }
        };

        let mut scored: Vec<(&str, i32)> = self
            .config
            .candidates
            .iter()
            .filter(|c| c.enabled)
            .map(|c| (c.model.as_str(), *c.scores.get(&label).unwrap_or(&0)))
            .filter(|(_, score)| *score >= self.config.min_score)
            .collect();

        if scored.is_empty() {
            let selected = fallback.ok_or_else(|| ChatError::Server("no candidates configured".to_string()))?;
            return Ok(RouteResult {
                selected: selected.clone(),
                candidates: vec![selected],
                classification_input: Some(input),
            });
        }

        scored.sort_by(|a, b| {
            b.1.cmp(&a.1).then_with(|| {
                let a_rank = self.config.tie_break_order.iter().position(|m| m == a.0).unwrap_or(usize::MAX);
                let b_rank = self.config.tie_break_order.iter().position(|m| m == b.0).unwrap_or(usize::MAX);
                a_rank.cmp(&b_rank)
            })
        });

        let mut candidates: Vec<String> = scored.into_iter().map(|(m, _)| m.to_string()).collect();
        if let Some(fb) = fallback {
            if !candidates.contains(&fb) {
                candidates.push(fb);
            }
        }

        Ok(RouteResult {
            selected: candidates[0].clone(),
            candidates,
            classification_input: Some(input),
        })
    }

    async fn classify(&self, input: &str) -> Result<String, ChatError> {
        let prompt = self.config.analyzer.prompt_override.clone().unwrap_or_else(|| {
            format!(
                "Classify the following conversation into exactly one of: {}. Respond with only the label.\n\n{}",
                self.config.analyzer.labels.join(", "),
                input
            )
        });
        let request = LlmRequest {
            model: self.config.analyzer.model.clone(),
            messages: vec![Message::user(crate::message::Content::Text(prompt))],
            candidates: vec![self.config.analyzer.model.clone()],
            request_id: None,
        };
        let timeout = std::time::Duration::from_millis(self.config.analyzer.timeout_ms);
        let response = tokio::time::timeout(timeout, self.analyzer.call(request))
            .await
            .map_err(|_| ChatError::Summary("analyzer call timed out".to_string()))??;
        let label = response.content.trim().to_string();
        if self.config.analyzer.labels.contains(&label) {
            Ok(label)
        } else {
            Err(ChatError::Summary(format!("analyzer returned unrecognized label: {label}")))
        }
    }
}

/// Encodes the classification input for the `x-user-input` response header
/// (§4.3 step 7: "base64-encoded, sanitized").
pub fn encode_user_input_header(input: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(input)
}

fn strip_fenced_code_blocks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_block = false;
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_block = !in_block;
            continue;
        }
        if !in_block {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::message::Content;
    use config::{AnalyzerConfig, SemanticCandidate};
    use std::collections::HashMap;

    fn config_with(candidates: Vec<SemanticCandidate>, fallback: Option<&str>) -> SemanticRouterConfig {
        SemanticRouterConfig {
            candidates,
            fallback_model_name: fallback.map(str::to_string),
            tie_break_order: vec![],
            min_score: 1,
            history_separator: "\n\n".to_string(),
            strip_code_blocks: false,
            max_user_messages: 10,
            max_history_bytes: 16_384,
            analyzer: AnalyzerConfig {
                model: "classifier-mini".to_string(),
                endpoint_override: None,
                token_override: None,
                timeout_ms: 3000,
                labels: vec!["simple_request".to_string(), "planning_request".to_string(), "code_modification".to_string()],
                prompt_override: None,
            },
        }
    }

    fn scores(pairs: &[(&str, i32)]) -> HashMap<String, i32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[tokio::test]
    async fn selects_top_scoring_candidate_for_label() {
        let candidates = vec![
            SemanticCandidate {
                model: "A".to_string(),
                enabled: true,
                scores: scores(&[("planning_request", 8)]),
            },
            SemanticCandidate {
                model: "B".to_string(),
                enabled: true,
                scores: scores(&[("planning_request", 5)]),
            },
        ];
        let mock = Arc::new(MockLlm::new());
        mock.push_response(crate::llm::LlmResponse {
            content: "planning_request".to_string(),
            ..Default::default()
        });
        let router = SemanticRouter::new(config_with(candidates, Some("B")), mock);
        let messages = vec![Message::user(Content::Text("Please draft a refactor plan.".to_string()))];
        let result = router.select(&messages).await.unwrap();
        assert_eq!(result.selected, "A");
        assert_eq!(result.candidates, vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn falls_back_when_analyzer_fails() {
        let candidates = vec![SemanticCandidate {
            model: "A".to_string(),
            enabled: true,
            scores: scores(&[]),
        }];
        let mock = Arc::new(MockLlm::new()); // no queued response -> analyzer errors
        let router = SemanticRouter::new(config_with(candidates, Some("B")), mock);
        let messages = vec![Message::user(Content::Text("hi".to_string()))];
        let result = router.select(&messages).await.unwrap();
        assert_eq!(result.selected, "B");
    }

    #[test]
    fn extract_input_caps_to_max_user_messages() {
        let candidates = vec![SemanticCandidate {
            model: "A".to_string(),
            enabled: true,
            scores: scores(&[]),
        }];
        let mut cfg = config_with(candidates, None);
        cfg.max_user_messages = 1;
        let mock = Arc::new(MockLlm::new());
        let router = SemanticRouter::new(cfg, mock);
        let messages = vec![
            Message::user(Content::Text("first".to_string())),
            Message::user(Content::Text("second".to_string())),
        ];
        assert_eq!(router.extract_input(&messages), "second");
    }
}
