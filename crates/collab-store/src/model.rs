use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use collab_core::ids::{BoardId, ObjectId};

pub const STICKY_NOTE_COLOR: &str = "#FDFD96";
pub const SHAPE_COLOR: &str = "#4ECDC4";
pub const CONNECTOR_COLOR: &str = "#888888";
pub const DEFAULT_CONNECTOR_STYLE: &str = "arrow";
pub const DEFAULT_SIZE: f64 = 200.0;

/// Object kinds this service creates. Stored as the `type` column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    StickyNote,
    Rectangle,
    Circle,
    Line,
    Frame,
    Connector,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StickyNote => "sticky_note",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Line => "line",
            Self::Frame => "frame",
            Self::Connector => "connector",
        }
    }

    fn default_color(self) -> &'static str {
        match self {
            Self::StickyNote => STICKY_NOTE_COLOR,
            Self::Connector => CONNECTOR_COLOR,
            _ => SHAPE_COLOR,
        }
    }
}

/// One row of `board_objects`.
///
/// `kind` is kept as a string: boards also hold objects drawn by people in
/// the canvas, whose types this service never creates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardObject {
    pub id: ObjectId,
    pub board_id: BoardId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub color: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default)]
    pub z_index: i64,
    #[serde(default = "empty_object")]
    pub metadata: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Parameters for a new sticky note, shape or frame. Absent fields take
/// the per-kind defaults.
#[derive(Clone, Debug)]
pub struct NewObject {
    pub kind: ObjectKind,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub color: Option<String>,
    pub text: Option<String>,
}

impl NewObject {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            x: None,
            y: None,
            width: None,
            height: None,
            color: None,
            text: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewConnector {
    pub from_id: ObjectId,
    pub to_id: ObjectId,
    pub color: Option<String>,
    pub style: Option<String>,
}

/// A single-aspect change to an existing object.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectPatch {
    Move { x: f64, y: f64 },
    Resize { width: f64, height: f64 },
    Text(String),
    Color(String),
}

impl ObjectPatch {
    /// Column/value pairs this patch writes.
    pub fn columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            Self::Move { x, y } => vec![("x", json!(x)), ("y", json!(y))],
            Self::Resize { width, height } => vec![("width", json!(width)), ("height", json!(height))],
            Self::Text(text) => vec![("text", json!(text))],
            Self::Color(color) => vec![("color", json!(color))],
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.columns()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

impl BoardObject {
    /// Build a fresh record with a new id and creation-time z-order.
    pub fn create(board_id: BoardId, new: NewObject) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            board_id,
            kind: new.kind.as_str().to_string(),
            x: new.x.unwrap_or(0.0),
            y: new.y.unwrap_or(0.0),
            width: new.width.unwrap_or(DEFAULT_SIZE),
            height: new.height.unwrap_or(DEFAULT_SIZE),
            rotation: 0.0,
            color: new.color.unwrap_or_else(|| new.kind.default_color().to_string()),
            text: new.text.unwrap_or_default(),
            z_index: now.timestamp_millis(),
            metadata: empty_object(),
            created_at: Some(now.to_rfc3339()),
        }
    }

    /// Build a connector record. Geometry is zero; endpoints live in metadata.
    pub fn connector(board_id: BoardId, new: NewConnector) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            board_id,
            kind: ObjectKind::Connector.as_str().to_string(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            color: new.color.unwrap_or_else(|| CONNECTOR_COLOR.to_string()),
            text: String::new(),
            z_index: now.timestamp_millis(),
            metadata: json!({
                "fromId": new.from_id,
                "toId": new.to_id,
                "style": new.style.unwrap_or_else(|| DEFAULT_CONNECTOR_STYLE.to_string()),
            }),
            created_at: Some(now.to_rfc3339()),
        }
    }

    pub fn apply(&mut self, patch: &ObjectPatch) {
        match patch {
            ObjectPatch::Move { x, y } => {
                self.x = *x;
                self.y = *y;
            }
            ObjectPatch::Resize { width, height } => {
                self.width = *width;
                self.height = *height;
            }
            ObjectPatch::Text(text) => self.text = text.clone(),
            ObjectPatch::Color(color) => self.color = color.clone(),
        }
    }
}

fn empty_object() -> Value {
    json!({})
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> BoardId {
        BoardId::from_raw("board-1")
    }

    #[test]
    fn sticky_note_defaults() {
        let obj = BoardObject::create(board(), NewObject::new(ObjectKind::StickyNote));
        assert_eq!(obj.kind, "sticky_note");
        assert_eq!((obj.x, obj.y), (0.0, 0.0));
        assert_eq!((obj.width, obj.height), (200.0, 200.0));
        assert_eq!(obj.color, STICKY_NOTE_COLOR);
        assert_eq!(obj.text, "");
        assert_eq!(obj.metadata, json!({}));
        assert!(obj.z_index > 0);
    }

    #[test]
    fn shape_uses_shape_color_and_given_geometry() {
        let obj = BoardObject::create(
            board(),
            NewObject {
                x: Some(10.0),
                y: Some(20.0),
                width: Some(300.0),
                height: Some(50.0),
                text: Some("Strengths".into()),
                ..NewObject::new(ObjectKind::Rectangle)
            },
        );
        assert_eq!(obj.kind, "rectangle");
        assert_eq!(obj.color, SHAPE_COLOR);
        assert_eq!((obj.x, obj.y, obj.width, obj.height), (10.0, 20.0, 300.0, 50.0));
        assert_eq!(obj.text, "Strengths");
    }

    #[test]
    fn connector_defaults() {
        let obj = BoardObject::connector(
            board(),
            NewConnector {
                from_id: ObjectId::from_raw("a"),
                to_id: ObjectId::from_raw("b"),
                color: None,
                style: None,
            },
        );
        assert_eq!(obj.kind, "connector");
        assert_eq!(obj.color, CONNECTOR_COLOR);
        assert_eq!((obj.width, obj.height), (0.0, 0.0));
        assert_eq!(obj.metadata, json!({"fromId": "a", "toId": "b", "style": "arrow"}));
    }

    #[test]
    fn row_json_uses_column_names() {
        let obj = BoardObject::create(board(), NewObject::new(ObjectKind::Frame));
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json["type"], "frame");
        assert_eq!(json["board_id"], "board-1");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn null_text_and_color_deserialize_as_empty() {
        let obj: BoardObject = serde_json::from_value(json!({
            "id": "o1", "board_id": "b", "type": "text",
            "x": 1, "y": 2, "width": 3, "height": 4,
            "color": null, "text": null, "z_index": 5
        }))
        .unwrap();
        assert_eq!(obj.text, "");
        assert_eq!(obj.color, "");
        assert_eq!(obj.x, 1.0);
        assert_eq!(obj.metadata, json!({}));
    }

    #[test]
    fn patch_columns_and_apply() {
        let mut obj = BoardObject::create(board(), NewObject::new(ObjectKind::StickyNote));
        let patch = ObjectPatch::Move { x: 5.0, y: 6.0 };
        assert_eq!(patch.to_json(), json!({"x": 5.0, "y": 6.0}));
        obj.apply(&patch);
        assert_eq!((obj.x, obj.y), (5.0, 6.0));

        obj.apply(&ObjectPatch::Color("#FFB7B2".into()));
        assert_eq!(obj.color, "#FFB7B2");
        assert_eq!(ObjectPatch::Text("hi".into()).to_json(), json!({"text": "hi"}));
    }
}
