use anyhow::Result;
use clap::{Parser, Subcommand};
use rapidd::{ai, config::ServerConfig, rest, storage::Storage, AppContext};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "rapidd",
    about = "RAPID assessment platform — API daemon",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP API port
    #[arg(long, env = "RAPIDD_PORT")]
    port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "RAPIDD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RAPIDD_LOG")]
    log: Option<String>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "RAPIDD_BIND")]
    bind_address: Option<String>,

    /// Emit structured JSON logs instead of the compact format
    #[arg(long)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start the API server (default when no subcommand given).
    Serve,
    /// Run retention maintenance once (prune expired sessions and stale
    /// drafts) and exit.
    Prune,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args.log.clone().unwrap_or_else(|| "info".to_string());
    setup_logging(&log_level, args.log_json);

    match args.command {
        None | Some(Command::Serve) => run_server(&args).await,
        Some(Command::Prune) => run_prune(&args).await,
    }
}

fn setup_logging(log_level: &str, json: bool) {
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .init();
    }
}

/// Load config from the data directory and apply CLI/env overrides.
fn load_config(args: &Args) -> ServerConfig {
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(ServerConfig::default_data_dir);
    let mut config = ServerConfig::load(&data_dir);
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = &args.bind_address {
        config.bind_address = bind.clone();
    }
    config
}

async fn build_context(args: &Args) -> Result<Arc<AppContext>> {
    let config = Arc::new(load_config(args));
    let storage = Arc::new(Storage::new(&config.data_dir).await?);
    let model = ai::from_config(&config.ai)?;
    Ok(Arc::new(AppContext::new(config, storage, model)))
}

async fn run_server(args: &Args) -> Result<()> {
    let ctx = build_context(args).await?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %ctx.config.data_dir.display(),
        model = %ctx.model.name(),
        "rapidd starting"
    );

    // Sweep expired sessions left over from the previous run before serving.
    match ctx.storage.prune_expired_auth_sessions().await {
        Ok(0) => {}
        Ok(n) => info!("removed {n} expired auth sessions"),
        Err(e) => warn!("startup session sweep failed: {e:#}"),
    }

    spawn_maintenance(ctx.clone());
    rest::start_rest_server(ctx).await
}

/// Hourly retention loop: expired auth sessions and stale drafts.
fn spawn_maintenance(ctx: Arc<AppContext>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        interval.tick().await; // skip immediate tick
        loop {
            interval.tick().await;
            match ctx.storage.prune_expired_auth_sessions().await {
                Ok(n) if n > 0 => info!("pruned {n} expired auth sessions"),
                Ok(_) => {}
                Err(e) => warn!("session pruning failed: {e:#}"),
            }
            let days = ctx.config.retention.draft_prune_days;
            match ctx.storage.prune_stale_drafts(days).await {
                Ok(n) if n > 0 => info!("pruned {n} stale draft assessments"),
                Ok(_) => {}
                Err(e) => warn!("draft pruning failed: {e:#}"),
            }
        }
    });
}

async fn run_prune(args: &Args) -> Result<()> {
    let ctx = build_context(args).await?;
    let sessions = ctx.storage.prune_expired_auth_sessions().await?;
    let drafts = ctx
        .storage
        .prune_stale_drafts(ctx.config.retention.draft_prune_days)
        .await?;
    ctx.storage.vacuum().await?;
    info!("pruned {sessions} auth sessions and {drafts} stale drafts");
    Ok(())
}
