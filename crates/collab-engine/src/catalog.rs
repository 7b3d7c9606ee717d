//! The fixed tool catalog offered to the model.

use serde_json::{json, Value};

use collab_core::tools::{ToolDefinition, ToolKind};

const STICKY_COLORS: &str = "Background color (hex). Common sticky note colors: #FDFD96 (yellow), \
#FFB7B2 (pink), #B5EAD7 (green), #C7CEEA (blue), #FFD8B1 (orange)";

pub fn description(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::CreateStickyNote => {
            "Create a sticky note on the board. Returns the created object's ID."
        }
        ToolKind::CreateShape => "Create a shape (rectangle, circle, or line) on the board.",
        ToolKind::CreateFrame => {
            "Create a frame (grouping area) on the board with a title label."
        }
        ToolKind::CreateConnector => "Create a connector/arrow between two objects on the board.",
        ToolKind::MoveObject => "Move an existing object to a new position.",
        ToolKind::ResizeObject => "Resize an existing object.",
        ToolKind::UpdateText => "Update the text content of an existing object.",
        ToolKind::ChangeColor => "Change the color of an existing object.",
        ToolKind::DeleteObjects => "Delete one or more objects from the board.",
        ToolKind::GetBoardState => {
            "Get all current objects on the board. Call this first to understand what's on \
             the board before making changes."
        }
    }
}

fn prop(ty: &str, description: &str) -> Value {
    json!({"type": ty, "description": description})
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

pub fn input_schema(kind: ToolKind) -> Value {
    match kind {
        ToolKind::CreateStickyNote => object_schema(
            json!({
                "text": prop("string", "Text content of the sticky note"),
                "x": prop("number", "X position on the board"),
                "y": prop("number", "Y position on the board"),
                "color": prop("string", STICKY_COLORS),
                "width": prop("number", "Width of the sticky note (default 200)"),
                "height": prop("number", "Height of the sticky note (default 200)"),
            }),
            &["text", "x", "y"],
        ),
        ToolKind::CreateShape => object_schema(
            json!({
                "type": {
                    "type": "string",
                    "enum": ["rectangle", "circle", "line"],
                    "description": "Type of shape",
                },
                "x": prop("number", "X position"),
                "y": prop("number", "Y position"),
                "width": prop("number", "Width of the shape"),
                "height": prop("number", "Height of the shape"),
                "color": prop("string", "Fill color (hex)"),
                "text": prop("string", "Optional text label inside the shape"),
            }),
            &["type", "x", "y", "width", "height"],
        ),
        ToolKind::CreateFrame => object_schema(
            json!({
                "title": prop("string", "Frame title/label"),
                "x": prop("number", "X position"),
                "y": prop("number", "Y position"),
                "width": prop("number", "Width of the frame"),
                "height": prop("number", "Height of the frame"),
                "color": prop("string", "Frame border/background color (hex)"),
            }),
            &["title", "x", "y", "width", "height"],
        ),
        ToolKind::CreateConnector => object_schema(
            json!({
                "fromId": prop("string", "ID of the source object"),
                "toId": prop("string", "ID of the target object"),
                "color": prop("string", "Connector color (hex)"),
            }),
            &["fromId", "toId"],
        ),
        ToolKind::MoveObject => object_schema(
            json!({
                "objectId": prop("string", "ID of the object to move"),
                "x": prop("number", "New X position"),
                "y": prop("number", "New Y position"),
            }),
            &["objectId", "x", "y"],
        ),
        ToolKind::ResizeObject => object_schema(
            json!({
                "objectId": prop("string", "ID of the object to resize"),
                "width": prop("number", "New width"),
                "height": prop("number", "New height"),
            }),
            &["objectId", "width", "height"],
        ),
        ToolKind::UpdateText => object_schema(
            json!({
                "objectId": prop("string", "ID of the object to update"),
                "newText": prop("string", "New text content"),
            }),
            &["objectId", "newText"],
        ),
        ToolKind::ChangeColor => object_schema(
            json!({
                "objectId": prop("string", "ID of the object"),
                "color": prop("string", "New color (hex)"),
            }),
            &["objectId", "color"],
        ),
        ToolKind::DeleteObjects => object_schema(
            json!({
                "objectIds": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of object IDs to delete",
                },
            }),
            &["objectIds"],
        ),
        ToolKind::GetBoardState => object_schema(json!({}), &[]),
    }
}

pub fn definition(kind: ToolKind) -> ToolDefinition {
    ToolDefinition {
        name: kind.name().to_string(),
        description: description(kind).to_string(),
        parameters_schema: input_schema(kind),
    }
}

/// Every board tool, in catalog order.
pub fn tool_catalog() -> Vec<ToolDefinition> {
    ToolKind::ALL.into_iter().map(definition).collect()
}
