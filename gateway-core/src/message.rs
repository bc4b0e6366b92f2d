//! The polymorphic chat message model (§3 `Message`).
//!
//! Grounded on the teacher's `ChatMessage`/`MessageContent`/`ContentPart` in
//! `openai_sse/request.rs`: content is either a plain string or an ordered list
//! of typed parts, and both shapes must round-trip unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One part of an array-shaped message content. Only `text` is a required
/// shape; any other `type` is captured as opaque extra fields and passed
/// through unchanged so the upstream LLM sees exactly what arrived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            part_type: "text".to_string(),
            text: Some(text.into()),
            extra: Map::new(),
        }
    }
}

/// A message's content: either a plain string or an ordered list of parts.
/// The shape MUST be preserved across the pipeline (§8 property 1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Flattens to plain text for classification/filtering purposes. Parts
    /// without a `text` field are skipped; parts are joined with nothing.
    pub fn as_text(&self) -> String {
        match self {
            Content::Text(s) => s.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Content::Text(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Unknown sibling fields on the message object (e.g. `name`, `tool_call_id`)
    /// are forwarded verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(Content::Text(text.into())),
            extra: Map::new(),
        }
    }

    pub fn user(content: Content) -> Self {
        Self {
            role: Role::User,
            content: Some(content),
            extra: Map::new(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(Content::Text(text.into())),
            extra: Map::new(),
        }
    }

    pub fn text(&self) -> String {
        self.content.as_ref().map(Content::as_text).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_content_round_trips_as_string() {
        let msg = Message::user(Content::Text("hi".to_string()));
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json["content"].is_string());
    }

    #[test]
    fn parts_content_round_trips_as_array() {
        let msg = Message::user(Content::Parts(vec![ContentPart::text("hi")]));
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json["content"].is_array());
    }

    #[test]
    fn as_text_joins_part_texts() {
        let content = Content::Parts(vec![ContentPart::text("a"), ContentPart::text("b")]);
        assert_eq!(content.as_text(), "ab");
    }

    #[test]
    fn unknown_part_type_is_preserved_on_round_trip() {
        let json = serde_json::json!({"type": "image_url", "image_url": {"url": "http://x"}});
        let part: ContentPart = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(part.part_type, "image_url");
        let back = serde_json::to_value(&part).unwrap();
        assert_eq!(back["image_url"]["url"], "http://x");
    }
}
