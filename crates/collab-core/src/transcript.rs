use crate::ids::ToolCallId;
use crate::messages::{AssistantMessage, Message};
use crate::tools::ToolResult;

/// An assistant turn's result batch did not answer its tool calls one to one,
/// in order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tool result batch does not match calls: expected {expected:?}, got {actual:?}")]
pub struct BatchMismatch {
    pub expected: Vec<ToolCallId>,
    pub actual: Vec<ToolCallId>,
}

/// Append-only turn history for a single run.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user_text(user_message)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append an assistant turn together with the results answering it.
    ///
    /// The pair goes in as a unit, so a call batch is never separated from
    /// its result batch. An assistant turn without calls takes an empty batch.
    pub fn push_exchange(
        &mut self,
        assistant: AssistantMessage,
        results: Vec<ToolResult>,
    ) -> Result<(), BatchMismatch> {
        let expected: Vec<ToolCallId> = assistant.tool_calls().iter().map(|c| c.id.clone()).collect();
        let actual: Vec<ToolCallId> = results.iter().map(|r| r.tool_call_id.clone()).collect();
        if expected != actual {
            return Err(BatchMismatch { expected, actual });
        }
        self.messages.push(Message::Assistant(assistant));
        self.messages.push(Message::tool_results(results));
        Ok(())
    }
}
