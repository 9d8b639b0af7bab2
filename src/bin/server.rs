//! tabwire Server Binary
//!
//! Starts the cube-root TCP server.

use clap::Parser;
use tabwire::{Config, Server};
use tracing_subscriber::{fmt, EnvFilter};

/// tabwire Server
#[derive(Parser, Debug)]
#[command(name = "tabwire-server")]
#[command(about = "Delimiter-framed cube-root TCP server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8001")]
    listen: String,

    /// Per-connection read timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "10000")]
    read_timeout_ms: u64,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Frame delimiter as a decimal byte value (9 = tab)
    #[arg(short, long, default_value = "9")]
    delimiter: u8,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tabwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("tabwire server v{}", tabwire::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .addr(&args.listen)
        .read_timeout_ms(args.read_timeout_ms)
        .max_connections(args.max_connections)
        .delimiter(args.delimiter)
        .build();

    let server = match Server::bind(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Listen error: {}", e);
            std::process::exit(1);
        }
    };

    let handle = server.handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        handle.shutdown();
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
