//! VerifAI Daemon - verification gateway in front of a generative model.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use verifaid::config::{self, Config};
use verifaid::{server, GeminiClient, ModelClient};

#[derive(Parser, Debug)]
#[command(name = "verifaid", version, about = "VerifAI verification gateway")]
struct Args {
    /// Config file (defaults to /etc/verifai/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Listen address, overrides server.bind_addr
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("VerifAI Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }

    let api_key = config::api_key_from_env()?;
    info!("  Model: {} at {}", config.model.model, config.model.endpoint);

    // The blocking HTTP client must be built and dropped outside the runtime.
    let client: Arc<dyn ModelClient> = Arc::new(GeminiClient::new(config.model.clone(), api_key)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let result = runtime.block_on(server::run(config, Arc::clone(&client)));

    drop(runtime);
    drop(client);
    result
}
