use collab_core::errors::GatewayError;
use collab_core::transcript::BatchMismatch;

/// Failures that end a whole run. Deadline and iteration exhaustion are
/// outcomes, not errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Transcript(#[from] BatchMismatch),
}

impl EngineError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Gateway(e) => e.error_kind(),
            Self::Transcript(_) => "transcript_mismatch",
        }
    }
}
