use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use collab_core::ids::{BoardId, ObjectId};

use crate::database::Database;
use crate::error::StoreError;
use crate::model::{BoardObject, ObjectPatch};
use crate::store::BoardStore;

const SELECT_COLUMNS: &str =
    "id, board_id, type, x, y, width, height, rotation, color, text, z_index, metadata, created_at";

/// Local board store on a single SQLite file.
#[derive(Clone)]
pub struct SqliteBoardStore {
    db: Database,
}

impl SqliteBoardStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Database::in_memory()?))
    }

    /// Run a blocking closure against the connection off the async runtime.
    async fn blocking<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.with_conn(f))
            .await
            .map_err(|e| StoreError::Database(format!("blocking task failed: {e}")))?
    }
}

fn row_to_object(row: &Row<'_>) -> rusqlite::Result<BoardObject> {
    let metadata: String = row.get(11)?;
    Ok(BoardObject {
        id: ObjectId::from_raw(row.get::<_, String>(0)?),
        board_id: BoardId::from_raw(row.get::<_, String>(1)?),
        kind: row.get(2)?,
        x: row.get(3)?,
        y: row.get(4)?,
        width: row.get(5)?,
        height: row.get(6)?,
        rotation: row.get(7)?,
        color: row.get(8)?,
        text: row.get(9)?,
        z_index: row.get(10)?,
        metadata: serde_json::from_str(&metadata).unwrap_or_else(|_| serde_json::json!({})),
        created_at: row.get(12)?,
    })
}

#[async_trait]
impl BoardStore for SqliteBoardStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    #[instrument(skip(self, object), fields(board_id = %object.board_id, object_id = %object.id))]
    async fn insert_object(&self, object: BoardObject) -> Result<BoardObject, StoreError> {
        self.blocking(move |conn| {
            let metadata = serde_json::to_string(&object.metadata)?;
            let created_at = object
                .created_at
                .clone()
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
            conn.execute(
                "INSERT INTO board_objects \
                 (id, board_id, type, x, y, width, height, rotation, color, text, z_index, metadata, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    object.id.as_str(),
                    object.board_id.as_str(),
                    object.kind,
                    object.x,
                    object.y,
                    object.width,
                    object.height,
                    object.rotation,
                    object.color,
                    object.text,
                    object.z_index,
                    metadata,
                    created_at,
                ],
            )?;
            Ok(BoardObject {
                created_at: Some(created_at),
                ..object
            })
        })
        .await
    }

    #[instrument(skip(self, patch), fields(board_id = %board_id, object_id = %id))]
    async fn update_object(
        &self,
        board_id: &BoardId,
        id: &ObjectId,
        patch: &ObjectPatch,
    ) -> Result<bool, StoreError> {
        let board_id = board_id.clone();
        let id = id.clone();
        let patch = patch.clone();
        self.blocking(move |conn| {
            let changed = match &patch {
                ObjectPatch::Move { x, y } => conn.execute(
                    "UPDATE board_objects SET x = ?1, y = ?2 WHERE id = ?3 AND board_id = ?4",
                    params![x, y, id.as_str(), board_id.as_str()],
                )?,
                ObjectPatch::Resize { width, height } => conn.execute(
                    "UPDATE board_objects SET width = ?1, height = ?2 WHERE id = ?3 AND board_id = ?4",
                    params![width, height, id.as_str(), board_id.as_str()],
                )?,
                ObjectPatch::Text(text) => conn.execute(
                    "UPDATE board_objects SET text = ?1 WHERE id = ?2 AND board_id = ?3",
                    params![text, id.as_str(), board_id.as_str()],
                )?,
                ObjectPatch::Color(color) => conn.execute(
                    "UPDATE board_objects SET color = ?1 WHERE id = ?2 AND board_id = ?3",
                    params![color, id.as_str(), board_id.as_str()],
                )?,
            };
            Ok(changed > 0)
        })
        .await
    }

    #[instrument(skip(self, ids), fields(board_id = %board_id, count = ids.len()))]
    async fn delete_objects(&self, board_id: &BoardId, ids: &[ObjectId]) -> Result<usize, StoreError> {
        let board_id = board_id.clone();
        let ids = ids.to_vec();
        self.blocking(move |conn| {
            let mut removed = 0;
            for id in &ids {
                removed += conn.execute(
                    "DELETE FROM board_objects WHERE id = ?1 AND board_id = ?2",
                    params![id.as_str(), board_id.as_str()],
                )?;
            }
            Ok(removed)
        })
        .await
    }

    #[instrument(skip(self), fields(board_id = %board_id))]
    async fn list_objects(&self, board_id: &BoardId) -> Result<Vec<BoardObject>, StoreError> {
        let board_id = board_id.clone();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM board_objects WHERE board_id = ?1 ORDER BY z_index ASC"
            ))?;
            let rows = stmt
                .query_map([board_id.as_str()], row_to_object)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }
}
