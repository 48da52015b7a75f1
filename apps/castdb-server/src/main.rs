//! REST API server for the flat-file character table.
//!
//! Loads the backing CSV into memory at startup, then serves the
//! character endpoints until ctrl-c.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use castdb_api::{router::Router, server::Server};
use castdb_core::{Store, StoreConfig};

/// Command-line arguments for the character server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 5002)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Backing CSV file
    #[arg(long, default_value = "./characters.csv")]
    data_file: String,

    /// Attempt budget for transient I/O errors during load and save
    #[arg(long, default_value_t = 5)]
    max_io_attempts: u32,

    /// Page size used when a listing request names no limit
    #[arg(long, default_value_t = 10)]
    page_size: usize,

    /// Request body read timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    // Create configuration
    let config = Arc::new(StoreConfig {
        data_path: PathBuf::from(&args.data_file),
        max_io_attempts: args.max_io_attempts,
        default_page_size: args.page_size,
        request_timeout_ms: args.request_timeout_ms,
    });

    // Load the backing file; a failed load serves 500s instead of aborting
    let store = Arc::new(Store::open((*config).clone()));
    if !store.is_available() {
        warn!(
            "serving in degraded mode: {} could not be loaded",
            args.data_file
        );
    }

    // Create router and server
    let router = Router::new(store, config);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let server = Server::new(addr, router);

    info!("Starting character server");
    info!("  Host: {}", args.host);
    info!("  Port: {}", args.port);
    info!("  Data file: {}", args.data_file);
    info!("  Request timeout: {} ms", args.request_timeout_ms);

    // Start server with graceful shutdown
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            error!("Server error: {}", e);
        }
    });

    // Wait for Ctrl+C
    signal::ctrl_c().await.expect("Failed to listen for ctrl_c");
    info!("Shutting down server");
    server_handle.abort();

    Ok(())
}
