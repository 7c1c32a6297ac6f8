//! LocalDrive server binary.
//!
//! Serves one local directory over HTTP for browsing, uploading and
//! downloading files.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use localdrive::config::Config;
use localdrive::http;
use localdrive::storage::StorageService;
use localdrive::ui::terminal_qr;

/// Share a single local directory over HTTP.
#[derive(Parser, Debug)]
#[command(name = "localdrive")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Storage directory to serve
    pub storage: Option<PathBuf>,

    /// Server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip printing the QR code on startup
    #[arg(long)]
    pub no_qr: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };

    // Environment overrides first, CLI flags on top
    config.apply_env_overrides();
    if let Some(storage) = cli.storage {
        config.storage.root = storage;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    // Initialize tracing
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.log.level.clone()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("LocalDrive starting...");

    // Open the storage root, creating it if necessary
    let service = StorageService::open(&config.storage.root)
        .await
        .with_context(|| {
            format!(
                "Failed to open storage root: {}",
                config.storage.root.display()
            )
        })?;
    tracing::info!("Storage path: {}", service.root().display());

    let app = http::router(Arc::new(service), config.storage.max_upload_size);

    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid host address: {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;

    let url = format!("http://{}:{}", display_ip(host), local_addr.port());
    tracing::info!("Server listening on: {}", url);
    println!("Server listening on: {url}");

    if !cli.no_qr {
        match terminal_qr(&url) {
            Ok(qr) => println!("\nScan to open on another device:\n\n{qr}"),
            Err(err) => tracing::warn!("Failed to generate QR code: {}", err),
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

/// Pick the address to advertise. A wildcard bind is useless in a URL,
/// so substitute the machine's LAN address when we can find one.
fn display_ip(host: IpAddr) -> IpAddr {
    if !host.is_unspecified() {
        return host;
    }
    local_ip_address::local_ip().unwrap_or(host)
}

/// Wait for a shutdown signal (SIGTERM or Ctrl-C).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(err) => {
                tracing::error!("Failed to register SIGTERM handler: {}", err);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Received Ctrl-C");
    }
}
