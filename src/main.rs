//! Aiwen IP MCP server CLI.

use aiwen_ip_mcp::dispatch::ReqwestTransport;
use aiwen_ip_mcp::server::{http, stdio, TransportMode};
use aiwen_ip_mcp::{Catalog, Config, McpServer};
use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "aiwen-ip-mcp")]
#[command(about = "MCP server for Aiwen IP lookups - location, scene, WHOIS, risk portrait")]
#[command(version)]
struct Args {
    /// Transport to serve on
    #[arg(short, long, value_enum, default_value = "stdio")]
    transport: TransportMode,

    /// Listen address for the http transport
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Path to a YAML configuration file (default: read from environment)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --print-config
    if args.print_config {
        println!("{}", Config::example());
        return Ok(());
    }

    // stdout carries the protocol, so logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            Config::load(path)?
        }
        None => {
            info!("Loading configuration from environment");
            Config::from_env()?
        }
    };

    // Handle --validate
    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    let config = Arc::new(config);
    let transport = ReqwestTransport::new(Duration::from_millis(config.upstream.timeout_ms))?;
    let catalog = Catalog::new(config.clone(), Arc::new(transport))?;
    let server = Arc::new(McpServer::new(Arc::new(catalog)));

    info!(
        transport = ?args.transport,
        ipv4_accuracy = %config.accuracy.ipv4,
        ipv6_accuracy = %config.accuracy.ipv6,
        "Starting Aiwen IP MCP server"
    );

    match args.transport {
        TransportMode::Stdio => stdio::run(server).await?,
        TransportMode::Http => http::run(server, args.bind).await?,
    }

    Ok(())
}
