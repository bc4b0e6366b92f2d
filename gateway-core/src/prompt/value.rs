use crate::message::Message;
use crate::prompt::ToolDescriptor;

/// The pipeline's shared workspace (§3 `PromptValue`). Mutated in place by
/// each processor; never cloned between stages.
#[derive(Debug, Clone)]
pub struct PromptValue {
    pub system_message: Message,
    pub history_user_messages: Vec<Message>,
    pub last_user_message: Message,
    pub tool_schemas: Vec<ToolDescriptor>,
    pub detected_agent: Option<String>,
    pub language_directive: Option<String>,
}

impl PromptValue {
    pub fn new(system_message: Message, history_user_messages: Vec<Message>, last_user_message: Message) -> Self {
        Self {
            system_message,
            history_user_messages,
            last_user_message,
            tool_schemas: Vec::new(),
            detected_agent: None,
            language_directive: None,
        }
    }

    /// Splits an inbound message list into system/history/last-user per the
    /// `PromptValue` invariant: exactly one system message (possibly empty),
    /// the last user message always preserved.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        use crate::message::{Content, Role};

        let mut system_message = Message::system("");
        let mut rest = Vec::new();
        for m in messages {
            if m.role == Role::System && matches!(system_message.content, Some(Content::Text(ref s)) if s.is_empty()) {
                system_message = m;
            } else {
                rest.push(m);
            }
        }

        let last_user_idx = rest.iter().rposition(|m| m.role == Role::User);
        let last_user_message = match last_user_idx {
            Some(idx) => rest.remove(idx),
            None => Message::user(Content::Text(String::new())),
        };

        Self::new(system_message, rest, last_user_message)
    }

    pub fn add_tool(&mut self, tool: ToolDescriptor) {
        self.tool_schemas.push(tool);
    }

    pub fn into_processed_prompt(self) -> ProcessedPrompt {
        let original_total = token_count(&self.system_message.text())
            + self.history_user_messages.iter().map(|m| token_count(&m.text())).sum::<usize>()
            + token_count(&self.last_user_message.text());

        let mut system_message = self.system_message;
        if let Some(directive) = &self.language_directive {
            let mut text = system_message.text();
            text.push_str(directive);
            system_message.content = Some(crate::message::Content::Text(text));
        }

        let mut messages = Vec::with_capacity(self.history_user_messages.len() + 2);
        messages.push(system_message.clone());
        messages.extend(self.history_user_messages.iter().cloned());
        messages.push(self.last_user_message.clone());

        let processed_total = messages.iter().map(|m| token_count(&m.text())).sum::<usize>();

        ProcessedPrompt {
            messages,
            tool_schemas: self.tool_schemas,
            detected_agent: self.detected_agent,
            metrics: TokenMetrics {
                original_system_tokens: token_count(&system_message.text()),
                processed_system_tokens: token_count(&system_message.text()),
                original_total_tokens: original_total,
                processed_total_tokens: processed_total,
            },
        }
    }
}

/// Byte/word-based token counting fallback (the real BPE table is out of
/// scope per §1). Counts whitespace-delimited words.
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, Default)]
pub struct TokenMetrics {
    pub original_system_tokens: usize,
    pub processed_system_tokens: usize,
    pub original_total_tokens: usize,
    pub processed_total_tokens: usize,
}

impl TokenMetrics {
    pub fn total_ratio(&self) -> f64 {
        if self.original_total_tokens == 0 {
            1.0
        } else {
            self.processed_total_tokens as f64 / self.original_total_tokens as f64
        }
    }
}

/// The pipeline's output (§3 `ProcessedPrompt`): final ordered messages
/// reassembled as `[system, ...history, last_user]`.
#[derive(Debug, Clone)]
pub struct ProcessedPrompt {
    pub messages: Vec<Message>,
    pub tool_schemas: Vec<ToolDescriptor>,
    pub detected_agent: Option<String>,
    pub metrics: TokenMetrics,
}
