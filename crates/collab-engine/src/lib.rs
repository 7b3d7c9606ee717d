pub mod catalog;
pub mod commands;
pub mod dispatcher;
pub mod error;
pub mod limiter;
pub mod prompt;
pub mod runner;

pub use dispatcher::ToolDispatcher;
pub use error::EngineError;
pub use limiter::{RateLimitConfig, RateLimitExceeded, RateLimiter};
pub use runner::{AgentRunner, RunOutcome, RunnerConfig};
