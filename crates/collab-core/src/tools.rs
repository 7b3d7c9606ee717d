use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ids::ToolCallId;

/// The closed set of board tools the model may call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolKind {
    CreateStickyNote,
    CreateShape,
    CreateFrame,
    CreateConnector,
    MoveObject,
    ResizeObject,
    UpdateText,
    ChangeColor,
    DeleteObjects,
    GetBoardState,
}

impl ToolKind {
    /// Catalog order, as offered to the model.
    pub const ALL: [ToolKind; 10] = [
        ToolKind::CreateStickyNote,
        ToolKind::CreateShape,
        ToolKind::CreateFrame,
        ToolKind::CreateConnector,
        ToolKind::MoveObject,
        ToolKind::ResizeObject,
        ToolKind::UpdateText,
        ToolKind::ChangeColor,
        ToolKind::DeleteObjects,
        ToolKind::GetBoardState,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CreateStickyNote => "createStickyNote",
            Self::CreateShape => "createShape",
            Self::CreateFrame => "createFrame",
            Self::CreateConnector => "createConnector",
            Self::MoveObject => "moveObject",
            Self::ResizeObject => "resizeObject",
            Self::UpdateText => "updateText",
            Self::ChangeColor => "changeColor",
            Self::DeleteObjects => "deleteObjects",
            Self::GetBoardState => "getBoardState",
        }
    }

    /// Exact, case-sensitive lookup by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tool definition sent to the model as part of the context.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters_schema: serde_json::Value,
}

/// Outcome of one tool call, answering the call with the same id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: ToolCallId,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(with = "duration_ms", default)]
    pub duration: Duration,
}

impl ToolResult {
    pub fn ok(tool_call_id: ToolCallId, content: impl Into<String>) -> Self {
        Self {
            tool_call_id,
            content: content.into(),
            is_error: false,
            duration: Duration::ZERO,
        }
    }

    pub fn error(tool_call_id: ToolCallId, content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::ok(tool_call_id, content)
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: ToolKind, reason: String },
    #[error("{0}")]
    ExecutionFailed(String),
    #[error("Tool {tool} timed out after {}s", .after.as_secs())]
    Timeout { tool: String, after: Duration },
    #[error("Internal error: tool crashed")]
    Panicked,
}

/// Serde helper for Duration as milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
