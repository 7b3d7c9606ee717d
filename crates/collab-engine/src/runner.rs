use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use collab_core::context::LlmContext;
use collab_core::ids::BoardId;
use collab_core::messages::{AssistantMessage, ToolCallBlock};
use collab_core::provider::{CompletionOptions, LlmProvider};
use collab_core::tools::ToolDefinition;
use collab_core::transcript::Transcript;

use crate::catalog::tool_catalog;
use crate::dispatcher::ToolDispatcher;
use crate::error::EngineError;
use crate::prompt::SYSTEM_PROMPT;

pub const ITERATION_LIMIT_MESSAGE: &str =
    "Reached maximum iterations. Some actions may have been completed.";
pub const DEADLINE_MESSAGE: &str =
    "The AI agent took too long to respond. Some actions may have been completed.";
/// Reply when the model ends its turn without any text.
pub const EMPTY_REPLY: &str = "Done!";

const DEFAULT_MAX_ITERATIONS: u32 = 15;
const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// Configuration for the agent runner.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Model queries allowed per run.
    pub max_iterations: u32,
    /// Wall-clock budget for the whole run.
    pub deadline: Duration,
    pub completion: CompletionOptions,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            deadline: DEFAULT_DEADLINE,
            completion: CompletionOptions::default(),
        }
    }
}

/// How a run ended. Every variant maps to a reply for the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(String),
    IterationLimit,
    DeadlineExceeded,
}

impl RunOutcome {
    pub fn into_response(self) -> String {
        match self {
            Self::Completed(text) => text,
            Self::IterationLimit => ITERATION_LIMIT_MESSAGE.to_string(),
            Self::DeadlineExceeded => DEADLINE_MESSAGE.to_string(),
        }
    }
}

/// Drives the query / dispatch loop for one command.
pub struct AgentRunner {
    provider: Arc<dyn LlmProvider>,
    dispatcher: ToolDispatcher,
    config: RunnerConfig,
    tools: Vec<ToolDefinition>,
    system_prompt: String,
}

impl AgentRunner {
    pub fn new(provider: Arc<dyn LlmProvider>, dispatcher: ToolDispatcher) -> Self {
        Self {
            provider,
            dispatcher,
            config: RunnerConfig::default(),
            tools: tool_catalog(),
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run one command to completion, the iteration cap, or the deadline.
    ///
    /// Board changes made before a limit is hit are kept. Tool calls still
    /// in flight at the deadline finish in the background.
    #[instrument(skip(self, message), fields(board_id = %board_id, model = self.provider.model()))]
    pub async fn run(&self, board_id: &BoardId, message: &str) -> Result<RunOutcome, EngineError> {
        match tokio::time::timeout(self.config.deadline, self.run_loop(board_id, message)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(deadline_secs = self.config.deadline.as_secs(), "run deadline exceeded");
                Ok(RunOutcome::DeadlineExceeded)
            }
        }
    }

    async fn run_loop(&self, board_id: &BoardId, message: &str) -> Result<RunOutcome, EngineError> {
        let mut transcript = Transcript::new(message);

        for iteration in 1..=self.config.max_iterations {
            let context = LlmContext {
                messages: transcript.messages().to_vec(),
                system_prompt: self.system_prompt.clone(),
                tools: self.tools.clone(),
            };
            let reply = self.provider.complete(&context, &self.config.completion).await?;

            if reply.is_end_turn() {
                info!(iteration, "run completed");
                return Ok(RunOutcome::Completed(final_text(&reply)));
            }

            let calls: Vec<ToolCallBlock> = reply.tool_calls().into_iter().cloned().collect();
            debug!(iteration, calls = calls.len(), stop_reason = ?reply.stop_reason, "dispatching tool calls");
            let results = self.dispatcher.dispatch_all(board_id, &calls).await;
            transcript.push_exchange(reply, results)?;
        }

        warn!(max_iterations = self.config.max_iterations, "iteration limit reached");
        Ok(RunOutcome::IterationLimit)
    }
}

fn final_text(reply: &AssistantMessage) -> String {
    let segments: Vec<&str> = reply
        .text_segments()
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect();
    if segments.is_empty() {
        EMPTY_REPLY.to_string()
    } else {
        segments.join("\n")
    }
}
