//! External Tool Executor (§4.4): detects and executes XML tools embedded in
//! a stream. Grounded on the teacher's `Tool` async_trait (`tools/trait.rs`):
//! a uniform capability set implemented per tool, registered in a single
//! tagged table (§9: "no need for deep inheritance").

pub mod backend;
pub mod params;

pub use backend::RagToolClient;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ChatError;
use crate::prompt::ToolDescriptor;

/// Uniform capability set for one server-side tool (§4.4): `{Detect, Execute,
/// ReadyCheck, Describe}` parameterized over its config.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> String;
    async fn ready(&self) -> bool;
    /// Executes the tool against the raw XML body captured between the
    /// opening and closing tags (exclusive of the tags themselves).
    async fn execute(&self, xml_body: &str) -> Result<String, ChatError>;
}

/// Registry of built-in tools, rebuilt wholesale when the `tools_prompt` or
/// `precise_context` config domain changes (§6: "the tool executor is
/// rebuilt wholesale when `tools_prompt` changes").
pub struct ToolExecutor {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolExecutor {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let tools = tools.into_iter().map(|t| (t.name().to_string(), t)).collect();
        Self { tools }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Readiness-probes every registered tool concurrently and returns only
    /// the ready ones as descriptors for `XmlToolAdapter` (§4.1 step 2:
    /// "skip unready tools; do not error").
    pub async fn ready_tool_descriptors(&self) -> Vec<ToolDescriptor> {
        let mut out = Vec::new();
        for tool in self.tools.values() {
            if tool.ready().await {
                out.push(ToolDescriptor {
                    name: tool.name().to_string(),
                    description: tool.description(),
                });
            }
        }
        out
    }

    pub async fn execute(&self, name: &str, xml_body: &str) -> Result<String, ChatError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ChatError::Extra(format!("unknown tool: {name}")))?;
        tool.execute(xml_body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> String {
            "## echo\nEchoes input.".to_string()
        }
        async fn ready(&self) -> bool {
            true
        }
        async fn execute(&self, xml_body: &str) -> Result<String, ChatError> {
            Ok(xml_body.to_string())
        }
    }

    struct UnreadyTool;

    #[async_trait]
    impl Tool for UnreadyTool {
        fn name(&self) -> &str {
            "unready"
        }
        fn description(&self) -> String {
            "## unready".to_string()
        }
        async fn ready(&self) -> bool {
            false
        }
        async fn execute(&self, _xml_body: &str) -> Result<String, ChatError> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn ready_descriptors_skips_unready_tools() {
        let executor = ToolExecutor::new(vec![Arc::new(EchoTool), Arc::new(UnreadyTool)]);
        let descriptors = executor.ready_tool_descriptors().await;
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "echo");
    }

    #[tokio::test]
    async fn execute_unknown_tool_is_an_error() {
        let executor = ToolExecutor::new(vec![Arc::new(EchoTool)]);
        assert!(executor.execute("missing", "").await.is_err());
    }

    #[tokio::test]
    async fn execute_known_tool_delegates_to_implementation() {
        let executor = ToolExecutor::new(vec![Arc::new(EchoTool)]);
        let result = executor.execute("echo", "<query>hi</query>").await.unwrap();
        assert_eq!(result, "<query>hi</query>");
    }
}
