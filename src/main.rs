// DynHub collector - main.rs
// Bootstraps config, opens the store, and serves the registry API.

use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;

use dynhub::app_state::AppState;
use dynhub::config_loader::load_config;
use dynhub::store::RegistryStore;
use dynhub::store_sled::SledRegistryStore;
use dynhub::web::build_registry_router;

#[derive(Parser, Debug)]
#[command(name = "dynhub", about = "Dynamic-IP registry collector")]
struct Args {
    /// Path to the TOML config file.
    #[arg(long)]
    config: Option<String>,

    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("failed to load config")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let store = SledRegistryStore::new(&config.data_dir)
        .with_context(|| format!("failed to open store at {}", config.data_dir))?;
    let store: Arc<Mutex<dyn RegistryStore>> = Arc::new(Mutex::new(store));

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, store));
    let router = build_registry_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("dynhub listening on {bind_addr}");

    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
