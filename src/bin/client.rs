//! tabwire Client Binary
//!
//! Sends a batch of random integers and prints the server's replies.

use clap::Parser;
use tabwire::{Client, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// tabwire Client
#[derive(Parser, Debug)]
#[command(name = "tabwire-client")]
#[command(about = "Send random integers to a tabwire server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8001")]
    server: String,

    /// Client id shown in log lines
    #[arg(long, default_value = "1")]
    id: u64,

    /// Number of requests to send
    #[arg(short = 'n', long, default_value = "5")]
    count: usize,

    /// Connect timeout in milliseconds
    #[arg(long, default_value = "2000")]
    connect_timeout_ms: u64,

    /// Write deadline for the request batch in milliseconds (0 = none)
    #[arg(long, default_value = "5")]
    write_timeout_ms: u64,

    /// Read deadline for each response in milliseconds (0 = none)
    #[arg(long, default_value = "10000")]
    read_timeout_ms: u64,

    /// Pause between connecting and sending, in milliseconds
    #[arg(long, default_value = "200")]
    settle_delay_ms: u64,

    /// Frame delimiter as a decimal byte value (9 = tab)
    #[arg(short, long, default_value = "9")]
    delimiter: u8,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tabwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .addr(&args.server)
        .request_count(args.count)
        .connect_timeout_ms(args.connect_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .client_read_timeout_ms(args.read_timeout_ms)
        .settle_delay_ms(args.settle_delay_ms)
        .delimiter(args.delimiter)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    let mut client = match Client::connect(args.id, &config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Dial error: {}", e);
            std::process::exit(1);
        }
    };

    let exchange = client.run();
    if !exchange.is_complete(config.request_count) {
        tracing::warn!(
            sent = exchange.sent,
            failed = exchange.failed,
            received = exchange.responses.len(),
            expected = config.request_count,
            "incomplete exchange"
        );
    }
}
