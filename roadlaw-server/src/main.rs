use anyhow::Context;
use roadlaw_agent::build_orchestrator;
use roadlaw_server::{AppState, ServerConfig, build_components, init_tracing, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;
    init_tracing(&config.log)?;

    let components = build_components(&config)?;
    let orchestrator = build_orchestrator(components, config.pipeline.clone());
    let state = AppState::new(orchestrator, config.api_key.clone());

    run_server(&config.host, config.port, state).await
}
