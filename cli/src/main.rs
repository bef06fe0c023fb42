mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use engine::{AuthTable, Hub};
use http_front::AppState;
use tracing::info;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Unofficial Stockfighter-compatible exchange simulator dispatch hub.
#[derive(Parser, Debug)]
#[command(name = "disorderbook", version, about)]
pub struct Cli {
    /// Path to a TOML config file; CLI flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of live order books.
    #[arg(long)]
    maxbooks: Option<usize>,

    /// HTTP listener port.
    #[arg(long)]
    port: Option<u16>,

    /// Metrics listener port.
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Path to the matching-engine executable spawned per book.
    #[arg(long)]
    engine_path: Option<PathBuf>,

    /// Path to the accounts/API-key JSON file; auth is disabled if omitted.
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// Default venue, eagerly created at startup.
    #[arg(long)]
    venue: Option<String>,

    /// Default symbol, eagerly created at startup.
    #[arg(long)]
    symbol: Option<String>,

    /// Enables the account-stock-orders (`STATUSALL`) endpoint.
    #[arg(long)]
    excess: Option<bool>,
}

#[tools::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = cli
        .config
        .as_ref()
        .map(|path| tools::toml::parse_file(path))
        .transpose()
        .context("failed to load config file")?;
    let resolved = config::resolve(file, &cli);

    let auth = match &resolved.hub.accounts_file {
        Some(path) => AuthTable::load(path).with_context(|| format!("failed to load accounts file {path:?}"))?,
        None => AuthTable::disabled(),
    };
    info!(auth_enabled = auth.is_enabled(), "accounts table loaded");

    let (hub, view, handle) = Hub::new(&resolved.hub);
    tokio::spawn(hub.run());
    tokio::spawn(view.run());

    let state = AppState::new(handle, auth, resolved.hub.excess);

    http_front::server::run(
        resolved.server_addr,
        resolved.metrics_addr,
        state,
        resolved.hub.default_venue,
        resolved.hub.default_symbol,
    )
    .await
}
