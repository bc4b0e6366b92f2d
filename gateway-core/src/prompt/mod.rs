//! The Prompt-Flow Pipeline (§4.1): a chain-of-responsibility over a shared
//! `PromptValue` workspace, grounded on the teacher's single-owner-workspace
//! pattern (`ReActState` flowing through graph nodes in `graph/mod.rs`).

mod agent_detector;
mod processor;
mod rules_injector;
mod user_msg_filter;
mod value;
mod xml_tool_adapter;

pub use agent_detector::AgentDetector;
pub use processor::ProcessorOutcome;
pub use rules_injector::RulesInjector;
pub use user_msg_filter::UserMsgFilter;
pub use value::{token_count, ProcessedPrompt, PromptValue, TokenMetrics};
pub use xml_tool_adapter::XmlToolAdapter;

use config::PromptMode;
use tracing::{debug, debug_span};

/// A single tool's name and server-rendered description, as supplied by the
/// tool executor (§4.4). Kept here (rather than importing `crate::tools`) to
/// avoid a dependency cycle; `crate::tools::ToolExecutor` produces these.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

/// Runs the processor chain selected by `prompt_mode` against `value`,
/// returning the assembled `ProcessedPrompt`. Fail-open: a processor error is
/// recorded but never aborts the chain (§4.1 Contract).
pub fn arrange(
    mut value: PromptValue,
    mode: PromptMode,
    rules_injector: Option<&RulesInjector>,
    user_msg_filter: &UserMsgFilter,
    agent_matchers: &[config::AgentMatcher],
    tools: &[ToolDescriptor],
    tool_use_rules_block: Option<&str>,
) -> ProcessedPrompt {
    AgentDetector::detect_with_matchers(&mut value, agent_matchers);

    let mut ran: Vec<(&'static str, ProcessorOutcome)> = Vec::new();
    if mode != PromptMode::Raw {
        if mode == PromptMode::Strict {
            if let Some(injector) = rules_injector {
                let span = debug_span!("processor", processor = "RulesInjector");
                let _g = span.enter();
                let outcome = injector.execute(&mut value, mode);
                ran.push(("RulesInjector", outcome));
            }
        }
        {
            let span = debug_span!("processor", processor = "UserMsgFilter");
            let _g = span.enter();
            let outcome = user_msg_filter.execute(&mut value);
            ran.push(("UserMsgFilter", outcome));
        }
        {
            let span = debug_span!("processor", processor = "XmlToolAdapter");
            let _g = span.enter();
            let outcome = XmlToolAdapter::new(tools, tool_use_rules_block).execute(&mut value);
            ran.push(("XmlToolAdapter", outcome));
        }
    }

    debug!(
        mode = ?mode,
        chain = ?ran.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
        "prompt pipeline finished"
    );

    value.into_processed_prompt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Content, Message};

    fn base_value() -> PromptValue {
        PromptValue::new(
            Message::system("# Tools\nYou are an assistant."),
            vec![],
            Message::user(Content::Text("hello".to_string())),
        )
    }

    #[test]
    fn raw_mode_runs_no_processors() {
        let value = base_value();
        let original_system = value.system_message.text();
        let filter = UserMsgFilter::default();
        let processed = arrange(value, PromptMode::Raw, None, &filter, &[], &[], None);
        assert_eq!(processed.messages[0].text(), original_system);
    }

    #[test]
    fn auto_mode_preserves_last_user_message() {
        let value = base_value();
        let last = value.last_user_message.clone();
        let filter = UserMsgFilter::default();
        let processed = arrange(value, PromptMode::Auto, None, &filter, &[], &[], None);
        assert_eq!(processed.messages.last().unwrap(), &last);
    }
}
