//! HTTP server for sheet validation and filtering.
//!
//! Loads the engine configuration (file, then environment overrides), builds
//! the router and serves until Ctrl+C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sheet_clean_api::{router::Router, server::Server};
use sheet_clean_core::config::CleanConfig;
use tokio::signal;

/// Command-line arguments for the cleaning server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Request body read timeout in milliseconds (overrides the config file)
    #[arg(long)]
    request_timeout_ms: Option<u64>,
}

fn load_config(args: &Args) -> anyhow::Result<CleanConfig> {
    let mut config = match &args.config {
        Some(path) => CleanConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CleanConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;
    if let Some(timeout) = args.request_timeout_ms {
        config.request_timeout_ms = timeout;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let config = Arc::new(load_config(&args)?);
    let router = Router::new(config.clone());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid host or port")?;
    let server = Server::new(addr, router);

    tracing::info!(
        host = %args.host,
        port = args.port,
        request_timeout_ms = config.request_timeout_ms,
        max_query_length = config.max_query_length,
        group_tags = ?config.group_tags,
        "Starting sheet-clean server"
    );

    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            tracing::error!("Server error: {}", e);
        }
    });

    signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c")?;
    tracing::info!("Shutting down server");
    server_handle.abort();

    Ok(())
}
