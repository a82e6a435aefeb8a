use anyhow::Context;
use sheetchat::providers::OpenAiProvider;
use sheetchat::{run_server, Config};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().context("failed to load configuration")?;
    if config.llm.api_key.trim().is_empty() {
        tracing::warn!("[CONFIG] No API key configured, completion requests will fail");
    }

    let provider = Arc::new(
        OpenAiProvider::new(&config.llm).context("failed to build completion client")?,
    );
    run_server(config, provider)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
