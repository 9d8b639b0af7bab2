//! tabwire Demo Binary
//!
//! Runs the server and one client in a single process, then shuts the
//! server down.

use std::thread;
use std::time::Duration;

use clap::Parser;
use tabwire::{Client, Config, Server};
use tracing_subscriber::{fmt, EnvFilter};

/// tabwire Demo
#[derive(Parser, Debug)]
#[command(name = "tabwire-demo")]
#[command(about = "Start a server, run one client against it, and stop")]
#[command(version)]
struct Args {
    /// Address to serve and dial
    #[arg(short, long, default_value = "127.0.0.1:8001")]
    addr: String,

    /// Number of requests the client sends
    #[arg(short = 'n', long, default_value = "5")]
    count: usize,

    /// Client write deadline in milliseconds (0 = none)
    #[arg(long, default_value = "5")]
    write_timeout_ms: u64,

    /// Delay between starting the server and dialing it, in milliseconds
    #[arg(long, default_value = "500")]
    startup_delay_ms: u64,
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
        .addr(&args.addr)
        .request_count(args.count)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let server = match Server::bind(config.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Listen error: {}", e);
            std::process::exit(1);
        }
    };
    let handle = server.handle();

    let server_thread = thread::spawn(move || server.run());

    thread::sleep(Duration::from_millis(args.startup_delay_ms));

    match Client::connect(1, &config) {
        Ok(mut client) => {
            client.run();
        }
        Err(e) => tracing::error!("Dial error: {}", e),
    }

    handle.shutdown();
    match server_thread.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
        Err(_) => {
            tracing::error!("Server thread panicked");
            std::process::exit(1);
        }
    }
}
