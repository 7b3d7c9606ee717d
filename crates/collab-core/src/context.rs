use crate::messages::Message;
use crate::tools::ToolDefinition;

/// Everything a provider needs for one query: the transcript so far, the
/// fixed system prompt and the tool catalog.
#[derive(Clone, Debug)]
pub struct LlmContext {
    pub messages: Vec<Message>,
    pub system_prompt: String,
    pub tools: Vec<ToolDefinition>,
}

impl LlmContext {
    /// Create an empty context (useful for testing).
    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: String::new(),
            tools: Vec::new(),
        }
    }
}
