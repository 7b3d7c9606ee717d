//! HTTP handlers for the AI command endpoint and health check.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use collab_core::ids::BoardId;

use crate::error::CommandError;
use crate::server::AppState;

pub const MISSING_FIELDS: &str = "board_id and message are required";

/// Inbound command. `sessionId` is accepted as an alias for the board.
#[derive(Debug, Default, Deserialize)]
pub struct CommandRequest {
    #[serde(default, alias = "sessionId", alias = "session_id", alias = "boardId")]
    pub board_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub response: String,
}

impl CommandRequest {
    /// Both fields present and non-blank.
    fn validate(self) -> Result<(BoardId, String), CommandError> {
        let board_id = self.board_id.map(BoardId::from_raw).filter(|b| !b.is_empty());
        let message = self.message.filter(|m| !m.trim().is_empty());
        match (board_id, message) {
            (Some(board_id), Some(message)) => Ok((board_id, message)),
            _ => Err(CommandError::InvalidRequest(MISSING_FIELDS.into())),
        }
    }
}

/// POST /api/ai/command
///
/// Validation runs before admission, so malformed requests do not count
/// against a board's rate limit.
#[instrument(skip_all)]
pub async fn ai_command(
    State(state): State<AppState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, CommandError> {
    let Json(request) = payload.map_err(|e| CommandError::InvalidRequest(e.body_text()))?;
    let (board_id, message) = request.validate()?;

    state.limiter.admit(board_id.as_str())?;
    info!(board_id = %board_id, message_len = message.len(), "ai command accepted");

    let response = state.orchestrator.run_command(&board_id, &message).await?;
    Ok(Json(CommandResponse { response }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
