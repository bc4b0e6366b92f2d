//! `RulesInjector` (§4.1, strict mode only).

use std::time::Instant;

use config::{AgentRulesConfig, PromptMode};

use crate::prompt::processor::ProcessorOutcome;
use crate::prompt::PromptValue;

pub struct RulesInjector {
    config: AgentRulesConfig,
}

impl RulesInjector {
    pub fn new(config: AgentRulesConfig) -> Self {
        Self { config }
    }

    /// For every rule of the detected agent whose `match_modes` includes
    /// `mode` AND whose first-line text contains at least one `match_key`,
    /// appends `"\n\n# Rules from <agent>\n<rules>"` to the system message.
    /// Multiple matching rules append in config order.
    ///
    /// Preserves the open-question behavior noted in the design notes: the
    /// literal `"\n\nRules:\n"` preface is appended whenever the agent has any
    /// configured rule entries at all, even if none ultimately match.
    pub fn execute(&self, value: &mut PromptValue, mode: PromptMode) -> ProcessorOutcome {
        let start = Instant::now();
        let Some(agent) = value.detected_agent.clone() else {
            return ProcessorOutcome::handled(start.elapsed());
        };
        let Some(rules) = self.config.agents.get(&agent) else {
            return ProcessorOutcome::handled(start.elapsed());
        };
        if rules.is_empty() {
            return ProcessorOutcome::handled(start.elapsed());
        }

        let first_line = value.system_message.text();
        let first_line = first_line.lines().next().unwrap_or("").to_string();

        let mut appended = String::from("\n\nRules:\n");
        for rule in rules {
            if !rule.match_modes.contains(&mode) {
                continue;
            }
            if rule.match_keys.iter().any(|key| first_line.contains(key.as_str())) {
                appended.push_str(&format!("\n\n# Rules from {agent}\n{}", rule.rules));
            }
        }

        let mut text = value.system_message.text();
        text.push_str(&appended);
        value.system_message.content = Some(crate::message::Content::Text(text));

        ProcessorOutcome::handled(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Content, Message};
    use config::AgentRule;
    use std::collections::HashMap;

    fn rules_config() -> AgentRulesConfig {
        let mut agents = HashMap::new();
        agents.insert(
            "code".to_string(),
            vec![AgentRule {
                match_modes: vec![PromptMode::Strict],
                match_keys: vec!["a highly skilled software engineer".to_string()],
                rules: "R1\nR2".to_string(),
            }],
        );
        AgentRulesConfig { agents }
    }

    #[test]
    fn injects_matching_rule_in_strict_mode() {
        let mut value = PromptValue::new(
            Message::system("You are a highly skilled software engineer."),
            vec![],
            Message::user(Content::Text("hi".to_string())),
        );
        value.detected_agent = Some("code".to_string());
        let injector = RulesInjector::new(rules_config());
        injector.execute(&mut value, PromptMode::Strict);
        assert!(value.system_message.text().ends_with("\n\nRules:\n\n\n# Rules from code\nR1\nR2"));
    }

    #[test]
    fn skips_rule_for_non_matching_mode() {
        let mut value = PromptValue::new(
            Message::system("You are a highly skilled software engineer."),
            vec![],
            Message::user(Content::Text("hi".to_string())),
        );
        value.detected_agent = Some("code".to_string());
        let injector = RulesInjector::new(rules_config());
        injector.execute(&mut value, PromptMode::Balanced);
        assert_eq!(value.system_message.text(), "You are a highly skilled software engineer.");
    }

    #[test]
    fn no_agent_detected_leaves_system_untouched() {
        let mut value = PromptValue::new(
            Message::system("plain"),
            vec![],
            Message::user(Content::Text("hi".to_string())),
        );
        let injector = RulesInjector::new(rules_config());
        injector.execute(&mut value, PromptMode::Strict);
        assert_eq!(value.system_message.text(), "plain");
    }
}
