use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use collab_engine::{EngineError, RateLimitExceeded};

/// Why a command request was not answered with a reply.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    RateLimited(#[from] RateLimitExceeded),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl CommandError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited(_) => "rate_limited",
            Self::Engine(e) => e.error_kind(),
        }
    }
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error_kind = self.error_kind(), error = %self, "command failed");
        } else {
            tracing::debug!(status = status.as_u16(), error_kind = self.error_kind(), error = %self, "command rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
