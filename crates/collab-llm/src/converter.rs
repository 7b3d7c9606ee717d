use serde::Deserialize;
use serde_json::{json, Value};

use collab_core::context::LlmContext;
use collab_core::errors::GatewayError;
use collab_core::ids::ToolCallId;
use collab_core::messages::{
    AssistantContent, AssistantMessage, Message, StopReason, TokenUsage, ToolCallBlock,
    ToolResultMessage, UserMessage,
};
use collab_core::provider::CompletionOptions;

/// Stand-in content for a result turn that answers no tool calls. The
/// Messages API rejects user turns with empty content.
pub const EMPTY_RESULT_BATCH_TEXT: &str = "(no tool calls were made)";

/// Stand-in content for an assistant turn whose reply had no text or
/// tool-use blocks (empty text blocks are rejected too).
pub const EMPTY_ASSISTANT_TEXT: &str = "(no content)";

/// Convert a full LlmContext into the Anthropic API request body.
pub fn build_request_body(context: &LlmContext, options: &CompletionOptions, model: &str) -> Value {
    let mut body = json!({
        "model": model,
        "max_tokens": options.max_tokens,
    });

    if let Some(temp) = options.temperature {
        body["temperature"] = json!(temp);
    }

    if !context.system_prompt.is_empty() {
        body["system"] = json!(context.system_prompt);
    }

    body["messages"] = json!(convert_messages(&context.messages));

    if !context.tools.is_empty() {
        let tools: Vec<Value> = context
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.parameters_schema,
                })
            })
            .collect();
        body["tools"] = json!(tools);
    }

    body
}

fn convert_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|msg| match msg {
            Message::User(user) => convert_user_message(user),
            Message::Assistant(asst) => convert_assistant_message(asst),
            Message::ToolResults(batch) => convert_tool_results(batch),
        })
        .collect()
}

fn convert_user_message(msg: &UserMessage) -> Value {
    json!({"role": "user", "content": [{"type": "text", "text": msg.text}]})
}

fn convert_assistant_message(msg: &AssistantMessage) -> Value {
    let mut content: Vec<Value> = msg
        .content
        .iter()
        .filter_map(|c| match c {
            AssistantContent::Text { text } if text.is_empty() => None,
            AssistantContent::Text { text } => Some(json!({"type": "text", "text": text})),
            AssistantContent::ToolCall(tc) => Some(convert_tool_call(tc)),
        })
        .collect();
    if content.is_empty() {
        content.push(json!({"type": "text", "text": EMPTY_ASSISTANT_TEXT}));
    }

    json!({"role": "assistant", "content": content})
}

fn convert_tool_call(tc: &ToolCallBlock) -> Value {
    json!({
        "type": "tool_use",
        "id": tc.id.as_str(),
        "name": tc.name,
        "input": tc.arguments,
    })
}

/// One user turn carrying every result of the batch, in call order.
fn convert_tool_results(msg: &ToolResultMessage) -> Value {
    if msg.results.is_empty() {
        return json!({
            "role": "user",
            "content": [{"type": "text", "text": EMPTY_RESULT_BATCH_TEXT}],
        });
    }

    let content: Vec<Value> = msg
        .results
        .iter()
        .map(|r| {
            let mut block = json!({
                "type": "tool_result",
                "tool_use_id": r.tool_call_id.as_str(),
                "content": r.content,
            });
            if r.is_error {
                block["is_error"] = json!(true);
            }
            block
        })
        .collect();

    json!({"role": "user", "content": content})
}

// ── Response parsing ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ApiContentBlock>,
    stop_reason: Option<StopReason>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
    #[serde(other)]
    Unsupported,
}

/// Parse a non-streaming Messages API response body.
pub fn parse_response(body: Value) -> Result<AssistantMessage, GatewayError> {
    let resp: ApiResponse = serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

    let content = resp
        .content
        .into_iter()
        .filter_map(|block| match block {
            ApiContentBlock::Text { text } => Some(AssistantContent::Text { text }),
            ApiContentBlock::ToolUse { id, name, input } => {
                Some(AssistantContent::ToolCall(ToolCallBlock {
                    id: ToolCallId::from_raw(id),
                    name,
                    arguments: input,
                }))
            }
            ApiContentBlock::Unsupported => None,
        })
        .collect();

    Ok(AssistantMessage {
        content,
        usage: resp.usage,
        stop_reason: resp.stop_reason,
    })
}
