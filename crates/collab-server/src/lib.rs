pub mod error;
pub mod handlers;
pub mod orchestrator;
pub mod server;

pub use error::CommandError;
pub use orchestrator::{AgentOrchestrator, EngineOrchestrator};
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
