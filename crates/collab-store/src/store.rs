use async_trait::async_trait;

use collab_core::ids::{BoardId, ObjectId};

use crate::error::StoreError;
use crate::model::{BoardObject, ObjectPatch};

/// Persistence for board objects. Every operation is scoped to one board.
#[async_trait]
pub trait BoardStore: Send + Sync {
    fn name(&self) -> &str;

    /// Persist a fully built record, returning it as stored.
    async fn insert_object(&self, object: BoardObject) -> Result<BoardObject, StoreError>;

    /// Apply `patch` to one object. Returns `false` when no such object exists.
    async fn update_object(
        &self,
        board_id: &BoardId,
        id: &ObjectId,
        patch: &ObjectPatch,
    ) -> Result<bool, StoreError>;

    /// Delete each listed object, returning how many rows were removed.
    async fn delete_objects(&self, board_id: &BoardId, ids: &[ObjectId]) -> Result<usize, StoreError>;

    /// All objects on the board, ordered by `z_index` ascending.
    async fn list_objects(&self, board_id: &BoardId) -> Result<Vec<BoardObject>, StoreError>;
}
