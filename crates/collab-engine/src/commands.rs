//! Tool calls parsed into typed board commands, and their execution
//! against a [`BoardStore`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use collab_core::ids::{BoardId, ObjectId};
use collab_core::tools::{ToolError, ToolKind};
use collab_store::{BoardObject, BoardStore, NewConnector, NewObject, ObjectKind, ObjectPatch};

const PREVIEW_CHARS: usize = 50;
pub const EMPTY_BOARD: &str = "The board is empty - no objects exist yet.";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StickyNoteArgs {
    #[serde(default)]
    text: String,
    x: Option<f64>,
    y: Option<f64>,
    color: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ShapeType {
    Rectangle,
    Circle,
    Line,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShapeArgs {
    #[serde(rename = "type")]
    shape: Option<ShapeType>,
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    color: Option<String>,
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameArgs {
    #[serde(default)]
    title: String,
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    color: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectorArgs {
    from_id: ObjectId,
    to_id: ObjectId,
    color: Option<String>,
    style: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveArgs {
    object_id: ObjectId,
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResizeArgs {
    object_id: ObjectId,
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTextArgs {
    object_id: ObjectId,
    new_text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeColorArgs {
    object_id: ObjectId,
    color: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteArgs {
    object_ids: Vec<ObjectId>,
}

/// One board mutation or query requested by the model.
#[derive(Clone, Debug)]
pub enum BoardCommand {
    Create(NewObject),
    Connect(NewConnector),
    Update { id: ObjectId, patch: ObjectPatch },
    Delete(Vec<ObjectId>),
    GetState,
}

fn args<T: DeserializeOwned>(kind: ToolKind, value: &Value) -> Result<T, ToolError> {
    T::deserialize(value).map_err(|e| ToolError::InvalidArguments {
        tool: kind,
        reason: e.to_string(),
    })
}

impl BoardCommand {
    /// Handler table: one arm per tool kind.
    pub fn parse(kind: ToolKind, input: &Value) -> Result<Self, ToolError> {
        let cmd = match kind {
            ToolKind::CreateStickyNote => {
                let a: StickyNoteArgs = args(kind, input)?;
                Self::Create(NewObject {
                    x: a.x,
                    y: a.y,
                    width: a.width,
                    height: a.height,
                    color: a.color,
                    text: Some(a.text),
                    ..NewObject::new(ObjectKind::StickyNote)
                })
            }
            ToolKind::CreateShape => {
                let a: ShapeArgs = args(kind, input)?;
                let shape = match a.shape {
                    Some(ShapeType::Circle) => ObjectKind::Circle,
                    Some(ShapeType::Line) => ObjectKind::Line,
                    Some(ShapeType::Rectangle) | None => ObjectKind::Rectangle,
                };
                Self::Create(NewObject {
                    x: a.x,
                    y: a.y,
                    width: a.width,
                    height: a.height,
                    color: a.color,
                    text: a.text,
                    ..NewObject::new(shape)
                })
            }
            ToolKind::CreateFrame => {
                let a: FrameArgs = args(kind, input)?;
                Self::Create(NewObject {
                    x: a.x,
                    y: a.y,
                    width: a.width,
                    height: a.height,
                    color: a.color,
                    text: Some(a.title),
                    ..NewObject::new(ObjectKind::Frame)
                })
            }
            ToolKind::CreateConnector => {
                let a: ConnectorArgs = args(kind, input)?;
                Self::Connect(NewConnector {
                    from_id: a.from_id,
                    to_id: a.to_id,
                    color: a.color,
                    style: a.style,
                })
            }
            ToolKind::MoveObject => {
                let a: MoveArgs = args(kind, input)?;
                Self::Update {
                    id: a.object_id,
                    patch: ObjectPatch::Move { x: a.x, y: a.y },
                }
            }
            ToolKind::ResizeObject => {
                let a: ResizeArgs = args(kind, input)?;
                Self::Update {
                    id: a.object_id,
                    patch: ObjectPatch::Resize {
                        width: a.width,
                        height: a.height,
                    },
                }
            }
            ToolKind::UpdateText => {
                let a: UpdateTextArgs = args(kind, input)?;
                Self::Update {
                    id: a.object_id,
                    patch: ObjectPatch::Text(a.new_text),
                }
            }
            ToolKind::ChangeColor => {
                let a: ChangeColorArgs = args(kind, input)?;
                Self::Update {
                    id: a.object_id,
                    patch: ObjectPatch::Color(a.color),
                }
            }
            ToolKind::DeleteObjects => {
                let a: DeleteArgs = args(kind, input)?;
                Self::Delete(a.object_ids)
            }
            ToolKind::GetBoardState => Self::GetState,
        };
        Ok(cmd)
    }

    /// Run against the store and describe the outcome for the model.
    pub async fn execute(self, store: &dyn BoardStore, board_id: &BoardId) -> Result<String, ToolError> {
        match self {
            Self::Create(new) => {
                let kind = new.kind.as_str();
                let record = BoardObject::create(board_id.clone(), new);
                let created = store
                    .insert_object(record)
                    .await
                    .map_err(|e| ToolError::ExecutionFailed(format!("Failed to create {kind}: {e}")))?;
                Ok(format!("Created {kind} with ID: {}", created.id))
            }
            Self::Connect(new) => {
                let record = BoardObject::connector(board_id.clone(), new);
                let created = store
                    .insert_object(record)
                    .await
                    .map_err(|e| ToolError::ExecutionFailed(format!("Failed to create connector: {e}")))?;
                Ok(format!("Created connector with ID: {}", created.id))
            }
            Self::Update { id, patch } => {
                let found = store
                    .update_object(board_id, &id, &patch)
                    .await
                    .map_err(|e| ToolError::ExecutionFailed(format!("Failed to update object {id}: {e}")))?;
                if found {
                    Ok(format!("Updated object {id}"))
                } else {
                    Err(ToolError::ExecutionFailed(format!("Object {id} not found")))
                }
            }
            Self::Delete(ids) => {
                store
                    .delete_objects(board_id, &ids)
                    .await
                    .map_err(|e| ToolError::ExecutionFailed(format!("Failed to delete objects: {e}")))?;
                Ok(format!("Deleted {} object(s)", ids.len()))
            }
            Self::GetState => {
                let objects = store
                    .list_objects(board_id)
                    .await
                    .map_err(|e| ToolError::ExecutionFailed(format!("Failed to read board state: {e}")))?;
                Ok(render_board_state(&objects))
            }
        }
    }
}

/// Plain-text board summary, one line per object in z-order.
pub fn render_board_state(objects: &[BoardObject]) -> String {
    if objects.is_empty() {
        return EMPTY_BOARD.to_string();
    }

    let mut lines = Vec::with_capacity(objects.len() + 1);
    lines.push(format!("Board has {} object(s):", objects.len()));
    for obj in objects {
        lines.push(format!(
            "  - {} (id={}) at ({:.0}, {:.0}) {:.0}x{:.0} color={} text=\"{}\"",
            obj.kind,
            obj.id,
            obj.x,
            obj.y,
            obj.width,
            obj.height,
            obj.color,
            preview(&obj.text),
        ));
    }
    lines.join("\n")
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
