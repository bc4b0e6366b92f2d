//! `XmlToolAdapter` (§4.1): splices ready tool descriptions into the system
//! prompt immediately after the literal `"# Tools"` header line.

use std::time::Instant;

use crate::message::Content;
use crate::prompt::processor::ProcessorOutcome;
use crate::prompt::{PromptValue, ToolDescriptor};

const TOOLS_HEADER: &str = "# Tools";

pub struct XmlToolAdapter<'a> {
    tools: &'a [ToolDescriptor],
    tool_use_rules_block: Option<&'a str>,
}

impl<'a> XmlToolAdapter<'a> {
    pub fn new(tools: &'a [ToolDescriptor], tool_use_rules_block: Option<&'a str>) -> Self {
        Self { tools, tool_use_rules_block }
    }

    /// `tools` is assumed to already be filtered to ready tools by the caller
    /// (the readiness probe is an async operation performed by the tool
    /// executor before the synchronous pipeline runs).
    pub fn execute(&self, value: &mut PromptValue) -> ProcessorOutcome {
        let start = Instant::now();

        if self.tools.is_empty() {
            return ProcessorOutcome::handled(start.elapsed());
        }

        let text = value.system_message.text();
        let Some(header_pos) = text.find(TOOLS_HEADER) else {
            return ProcessorOutcome::failed("system message has no \"# Tools\" header", start.elapsed());
        };
        let header_end = header_pos + TOOLS_HEADER.len();

        let mut insertion = String::from("\n");
        for tool in self.tools {
            insertion.push_str(&tool.description);
            insertion.push('\n');
        }
        if let Some(rules) = self.tool_use_rules_block {
            insertion.push_str(rules);
            insertion.push('\n');
        }

        let mut spliced = String::with_capacity(text.len() + insertion.len());
        spliced.push_str(&text[..header_end]);
        spliced.push_str(&insertion);
        spliced.push_str(&text[header_end..]);

        value.system_message.content = Some(Content::Text(spliced));
        for tool in self.tools {
            value.add_tool(tool.clone());
        }

        ProcessorOutcome::handled(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn value_with_header() -> PromptValue {
        PromptValue::new(
            Message::system("intro\n# Tools\noutro"),
            vec![],
            Message::user(Content::Text("hi".to_string())),
        )
    }

    #[test]
    fn splices_tool_descriptions_after_header() {
        let mut value = value_with_header();
        let tools = vec![ToolDescriptor {
            name: "codebase_search".to_string(),
            description: "## codebase_search\nSearch code.".to_string(),
        }];
        let adapter = XmlToolAdapter::new(&tools, None);
        let outcome = adapter.execute(&mut value);
        assert!(outcome.handled);
        assert!(value.system_message.text().contains("## codebase_search\nSearch code."));
        assert_eq!(value.tool_schemas.len(), 1);
    }

    #[test]
    fn missing_header_fails_open() {
        let mut value = PromptValue::new(Message::system("no header here"), vec![], Message::user(Content::Text("hi".to_string())));
        let tools = vec![ToolDescriptor {
            name: "codebase_search".to_string(),
            description: "desc".to_string(),
        }];
        let adapter = XmlToolAdapter::new(&tools, None);
        let outcome = adapter.execute(&mut value);
        assert!(!outcome.handled);
        assert_eq!(value.system_message.text(), "no header here");
    }

    #[test]
    fn no_tools_is_a_no_op() {
        let mut value = value_with_header();
        let adapter = XmlToolAdapter::new(&[], None);
        let outcome = adapter.execute(&mut value);
        assert!(outcome.handled);
        assert_eq!(value.system_message.text(), "intro\n# Tools\noutro");
    }
}
