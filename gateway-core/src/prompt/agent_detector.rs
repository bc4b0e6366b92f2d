//! `AgentDetector` (§4.1): runs inline before the chain, not as a chain link.

use crate::prompt::PromptValue;
use config::AgentMatcher;

pub struct AgentDetector;

impl AgentDetector {
    /// Inspects the first line of the system message against `matchers`
    /// (`{match_key -> agent_name}`); first match wins. Absence leaves
    /// `detected_agent` as `None`.
    pub fn detect_with_matchers(value: &mut PromptValue, matchers: &[AgentMatcher]) {
        let first_line = value.system_message.text();
        let first_line = first_line.lines().next().unwrap_or("");
        for matcher in matchers {
            if first_line.contains(&matcher.match_key) {
                value.detected_agent = Some(matcher.agent_name.clone());
                return;
            }
        }
    }

    /// Convenience used when no matcher table is configured yet.
    pub fn detect(value: &mut PromptValue) {
        Self::detect_with_matchers(value, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Content, Message};

    fn value_with_system(text: &str) -> PromptValue {
        PromptValue::new(Message::system(text), vec![], Message::user(Content::Text("hi".to_string())))
    }

    #[test]
    fn first_match_wins() {
        let mut value = value_with_system("You are a highly skilled software engineer.");
        let matchers = vec![
            AgentMatcher {
                match_key: "highly skilled software engineer".to_string(),
                agent_name: "code".to_string(),
            },
            AgentMatcher {
                match_key: "highly skilled".to_string(),
                agent_name: "generic".to_string(),
            },
        ];
        AgentDetector::detect_with_matchers(&mut value, &matchers);
        assert_eq!(value.detected_agent.as_deref(), Some("code"));
    }

    #[test]
    fn no_match_leaves_agent_empty() {
        let mut value = value_with_system("You are unremarkable.");
        AgentDetector::detect_with_matchers(&mut value, &[]);
        assert!(value.detected_agent.is_none());
    }
}
