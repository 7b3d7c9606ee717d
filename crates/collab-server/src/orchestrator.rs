//! Agent orchestrator: the seam between HTTP handlers and the engine.

use async_trait::async_trait;

use collab_core::ids::BoardId;
use collab_engine::{AgentRunner, EngineError};

/// Runs one natural-language command against a board and returns the reply.
#[async_trait]
pub trait AgentOrchestrator: Send + Sync {
    async fn run_command(&self, board_id: &BoardId, message: &str) -> Result<String, EngineError>;
}

/// Production orchestrator backed by [`AgentRunner`].
pub struct EngineOrchestrator {
    runner: AgentRunner,
}

impl EngineOrchestrator {
    pub fn new(runner: AgentRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl AgentOrchestrator for EngineOrchestrator {
    async fn run_command(&self, board_id: &BoardId, message: &str) -> Result<String, EngineError> {
        let outcome = self.runner.run(board_id, message).await?;
        Ok(outcome.into_response())
    }
}
