use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::Level;

use collab_core::provider::CompletionOptions;
use collab_engine::{AgentRunner, RateLimitConfig, RateLimiter, RunnerConfig, ToolDispatcher};
use collab_llm::AnthropicProvider;
use collab_server::{AppState, EngineOrchestrator, ServerConfig};
use collab_settings::CollabSettings;
use collab_store::{BoardStore, Database, SqliteBoardStore, SupabaseBoardStore};
use collab_telemetry::TelemetryConfig;

/// CollabBoard AI command server.
#[derive(Debug, Parser)]
#[command(name = "collab", version)]
struct Args {
    /// Settings file (defaults to $COLLAB_CONFIG or ./collab.json).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// trace, debug, info, warn or error.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let path = args.config.clone().unwrap_or_else(collab_settings::settings_path);
    let mut settings = collab_settings::load_settings_from_path(&path)
        .with_context(|| format!("loading settings from {}", path.display()))?;
    apply_args(&mut settings, &args);

    collab_telemetry::init_telemetry(&TelemetryConfig {
        log_level: collab_telemetry::parse_level(&settings.logging.level).unwrap_or(Level::INFO),
        json: settings.logging.json,
        ..Default::default()
    })?;
    tracing::info!(config = %path.display(), "starting collab server");

    let api_key = settings
        .anthropic
        .api_key()
        .context("ANTHROPIC_API_KEY is not set")?;
    let provider = AnthropicProvider::new(api_key, Some(&settings.agent.model))?
        .with_base_url(settings.anthropic.base_url.clone());

    let store = open_store(&settings)?;
    tracing::info!(store = store.name(), model = %settings.agent.model, "backends ready");

    let dispatcher = ToolDispatcher::new(store).with_tool_timeout(settings.agent.tool_timeout());
    let runner = AgentRunner::new(Arc::new(provider), dispatcher).with_config(RunnerConfig {
        max_iterations: settings.agent.max_iterations,
        deadline: settings.agent.timeout(),
        completion: CompletionOptions {
            max_tokens: settings.agent.max_tokens,
            ..Default::default()
        },
    });

    let state = AppState {
        orchestrator: Arc::new(EngineOrchestrator::new(runner)),
        limiter: Arc::new(RateLimiter::new(RateLimitConfig {
            limit: settings.rate_limit.max_requests,
            window: settings.rate_limit.window(),
        })),
    };
    let config = ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
        allowed_origins: settings.server.allowed_origins.clone(),
        sweep_interval: settings.rate_limit.sweep_interval(),
    };

    let handle = collab_server::start(config, state)
        .await
        .context("starting HTTP server")?;
    tracing::info!(addr = %handle.addr, "collab server ready");

    tokio::signal::ctrl_c()
        .await
        .context("listening for ctrl+c")?;

    tracing::info!("shutting down");
    handle.shutdown().await;
    Ok(())
}

fn apply_args(settings: &mut CollabSettings, args: &Args) {
    if let Some(host) = &args.host {
        settings.server.host = host.clone();
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(level) = &args.log_level {
        settings.logging.level = level.clone();
    }
}

/// Supabase when both its URL and service key are configured, otherwise the
/// local SQLite file.
fn open_store(settings: &CollabSettings) -> anyhow::Result<Arc<dyn BoardStore>> {
    if let Some((url, key)) = settings.supabase.credentials() {
        let store = SupabaseBoardStore::new(&url, key)?;
        return Ok(Arc::new(store));
    }

    let path = &settings.storage.sqlite_path;
    let db = Database::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Arc::new(SqliteBoardStore::new(db)))
}
