//! Game server binary
//!
//! Usage: `warroom-server [config.ron]`. Without an argument the server reads
//! `config/server.ron` if it exists and falls back to built-in defaults.

use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use warroom_db::Store;
use warroom_server::config::PORT_VAR;
use warroom_server::{http, App, Config};

const DEFAULT_CONFIG: &str = "config/server.ron";

fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(Config::load(path)?),
        None if Path::new(DEFAULT_CONFIG).exists() => Ok(Config::load(DEFAULT_CONFIG)?),
        None => Ok(Config::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::var(PORT_VAR).ok();
    let addr = config.listen_addr(port.as_deref())?;

    let store = match &config.database {
        Some(path) => {
            tracing::info!(path = %path, "opening database");
            Store::open(path)?
        }
        None => {
            tracing::warn!("no database configured, games are kept in memory");
            Store::in_memory()?
        }
    };

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        workers = config.worker_threads(),
        nations = config.default_nations.len(),
        min_players = config.min_players,
        "listening"
    );

    let app = Arc::new(App::new(store, config));
    http::serve(app, listener).await;
    Ok(())
}
