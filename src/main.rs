//! calmcp - calendar and todo tools for assistants, served over MCP stdio
//!
//! Reads newline-delimited JSON-RPC from stdin and answers on stdout.
//! Logs go to stderr (RUST_LOG, default "info").
//!
//! Connection settings come from ~/.config/calmcp/config.toml, a .env file,
//! and CALDAV_* environment variables, later sources winning.

mod config;
mod mcp;
mod tools;

use anyhow::{Context, Result};
use calmcp_core::tools::CalendarTools;
use calmcp_provider_caldav::CalDavGateway;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calmcp")]
#[command(about = "Expose a CalDAV server's calendars and todos as MCP tools over stdio")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/calmcp/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let settings = config::load_settings(cli.config.as_deref())?;
    tracing::info!(url = %settings.url, username = %settings.username, "starting calmcp");

    // The blocking HTTP client owns a runtime of its own; build and drop it off this one
    let gateway = tokio::task::spawn_blocking(move || CalDavGateway::new(settings))
        .await
        .context("Task join error")?
        .context("Failed to set up CalDAV client")?;

    let server = mcp::Server::new(CalendarTools::new(gateway));
    let served = server.serve_stdio().await;

    tokio::task::spawn_blocking(move || drop(server))
        .await
        .context("Task join error")?;

    served
}
