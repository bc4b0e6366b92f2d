//! `UserMsgFilter` (§4.1): operates only on the history list, never on system
//! or last-user. Three independent passes: dedup, tool-UI stripping,
//! optional environment-details dedup.

use std::time::Instant;

use crate::message::Content;
use crate::prompt::processor::ProcessorOutcome;
use crate::prompt::PromptValue;

const SEARCH_MARKER_START: &str = "\n#### \u{1f50d} ";
const SEARCH_MARKER_END: &str = "\u{5de5}\u{5177}\u{68c0}\u{7d22}\u{4e2d}.....";
const DONE_MARKER: &str = "\n#### \u{1f4a1} \u{68c0}\u{7d22}\u{5df2}\u{5b8c}\u{6210}，\u{5206}\u{6790}\u{4e2d}...";

#[derive(Default)]
pub struct UserMsgFilter {
    pub dedupe_environment_details: bool,
}

impl UserMsgFilter {
    pub fn new(dedupe_environment_details: bool) -> Self {
        Self { dedupe_environment_details }
    }

    pub fn execute(&self, value: &mut PromptValue) -> ProcessorOutcome {
        let start = Instant::now();

        dedup_string_messages(&mut value.history_user_messages);
        strip_tool_ui_noise(&mut value.history_user_messages);
        if self.dedupe_environment_details {
            dedupe_environment_details(&mut value.history_user_messages);
        }

        ProcessorOutcome::handled(start.elapsed())
    }
}

/// Keeps only the last occurrence of each identical plain-string content,
/// preserving the order of kept messages.
fn dedup_string_messages(messages: &mut Vec<crate::message::Message>) {
    let mut last_index_for_text: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for (idx, m) in messages.iter().enumerate() {
        if let Some(Content::Text(text)) = &m.content {
            last_index_for_text.insert(text.clone(), idx);
        }
    }
    let keep: std::collections::HashSet<usize> = last_index_for_text.values().copied().collect();
    let mut kept_idx = 0usize;
    messages.retain(|m| {
        let retained = match &m.content {
            Some(Content::Text(_)) => keep.contains(&kept_idx),
            _ => true,
        };
        kept_idx += 1;
        retained
    });
}

/// Removes earlier orchestrator-emitted UI noise from assistant messages so it
/// never re-enters the LLM: every span bounded by the search-filler markers,
/// and every occurrence of the "done" marker.
fn strip_tool_ui_noise(messages: &mut [crate::message::Message]) {
    use crate::message::Role;
    for m in messages.iter_mut() {
        if m.role != Role::Assistant {
            continue;
        }
        if let Some(Content::Text(text)) = &m.content {
            let stripped = strip_search_spans(text);
            let stripped = stripped.replace(DONE_MARKER, "");
            m.content = Some(Content::Text(stripped));
        }
    }
}

fn strip_search_spans(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(start) = rest.find(SEARCH_MARKER_START) else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..start]);
        let after_start = &rest[start..];
        match after_start.find(SEARCH_MARKER_END) {
            Some(end_rel) => {
                let end = end_rel + SEARCH_MARKER_END.len();
                rest = &after_start[end..];
            }
            None => {
                // Unterminated span: drop the rest rather than leak a partial marker.
                break;
            }
        }
    }
    out
}

/// For user messages whose content is a list of parts, keeps the first text
/// part beginning with `<environment_details>` and drops subsequent ones.
fn dedupe_environment_details(messages: &mut [crate::message::Message]) {
    use crate::message::Role;
    for m in messages.iter_mut() {
        if m.role != Role::User {
            continue;
        }
        if let Some(Content::Parts(parts)) = &mut m.content {
            let mut seen_env = false;
            parts.retain(|p| {
                let is_env = p.text.as_deref().is_some_and(|t| t.starts_with("<environment_details>"));
                if is_env {
                    if seen_env {
                        return false;
                    }
                    seen_env = true;
                }
                true
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ContentPart, Message};

    #[test]
    fn dedup_keeps_last_occurrence_preserving_order() {
        let mut messages = vec![
            Message::user(Content::Text("a".to_string())),
            Message::user(Content::Text("b".to_string())),
            Message::user(Content::Text("a".to_string())),
        ];
        dedup_string_messages(&mut messages);
        let texts: Vec<_> = messages.iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["b", "a"]);
    }

    #[test]
    fn dedup_is_idempotent() {
        let mut messages = vec![
            Message::user(Content::Text("a".to_string())),
            Message::user(Content::Text("b".to_string())),
            Message::user(Content::Text("a".to_string())),
        ];
        dedup_string_messages(&mut messages);
        let once = messages.clone();
        dedup_string_messages(&mut messages);
        assert_eq!(messages.iter().map(|m| m.text()).collect::<Vec<_>>(), once.iter().map(|m| m.text()).collect::<Vec<_>>());
    }

    #[test]
    fn strips_search_span_and_done_marker() {
        let text = format!(
            "before{}codebase_search {}after{}tail",
            SEARCH_MARKER_START, SEARCH_MARKER_END, DONE_MARKER
        );
        let mut messages = vec![Message::assistant(text)];
        strip_tool_ui_noise(&mut messages);
        assert_eq!(messages[0].text(), "beforeaftertail");
    }

    #[test]
    fn environment_details_dedup_keeps_first_only() {
        let mut messages = vec![Message::user(Content::Parts(vec![
            ContentPart::text("<environment_details>one</environment_details>"),
            ContentPart::text("<environment_details>two</environment_details>"),
            ContentPart::text("plain"),
        ]))];
        dedupe_environment_details(&mut messages);
        let Some(Content::Parts(parts)) = &messages[0].content else {
            panic!("expected parts");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].text.as_deref(), Some("<environment_details>one</environment_details>"));
    }
}
