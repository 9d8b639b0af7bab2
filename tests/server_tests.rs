//! Server Tests
//!
//! End-to-end tests against a real server on loopback. These tests verify:
//! - Cube-root responses and validation errors
//! - Connections survive invalid requests
//! - Concurrent connections never see each other's responses
//! - Read deadlines, connection limits and graceful shutdown
//! - Failed writes on either side

use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tabwire::error::{Result, WireError};
use tabwire::network::{Client, CloseReason, Connection, Server, ServerHandle, ShutdownSignal};
use tabwire::protocol::{Channel, DEFAULT_DELIMITER};
use tabwire::Config;

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config() -> Config {
    Config::builder()
        .addr("127.0.0.1:0")
        .accept_poll_ms(10)
        .write_timeout_ms(1_000)
        .client_read_timeout_ms(5_000)
        .settle_delay_ms(0)
        .build()
}

struct TestServer {
    addr: SocketAddr,
    handle: ServerHandle,
    thread: JoinHandle<Result<()>>,
}

impl TestServer {
    fn start(config: Config) -> Self {
        let server = Server::bind(config).unwrap();
        let addr = server.local_addr().unwrap();
        let handle = server.handle();
        let thread = thread::spawn(move || server.run());
        Self {
            addr,
            handle,
            thread,
        }
    }

    /// Client config pointing at this server
    fn client_config(&self) -> Config {
        let mut config = test_config();
        config.addr = self.addr.to_string();
        config
    }

    fn channel(&self) -> Channel {
        let stream = TcpStream::connect(self.addr).unwrap();
        let channel = Channel::new(stream, DEFAULT_DELIMITER);
        channel
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        channel
    }

    fn stop(self) {
        self.handle.shutdown();
        self.thread.join().unwrap().unwrap();
    }
}

fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        thread::sleep(Duration::from_millis(10));
    }
}

// =============================================================================
// Request/Response Tests
// =============================================================================

#[test]
fn test_cube_root_responses() {
    let server = TestServer::start(test_config());
    let mut channel = server.channel();

    channel.send("8").unwrap();
    assert_eq!(channel.receive().unwrap(), "The cube root of 8 is 2.000000.");

    channel.send("-8").unwrap();
    assert_eq!(channel.receive().unwrap(), "The cube root of -8 is -2.000000.");

    drop(channel);
    server.stop();
}

#[test]
fn test_invalid_request_keeps_connection_open() {
    let server = TestServer::start(test_config());
    let mut channel = server.channel();

    channel.send("abc").unwrap();
    assert_eq!(channel.receive().unwrap(), "\"abc\" is not integer");

    channel.send("99999999999").unwrap();
    assert_eq!(channel.receive().unwrap(), "99999999999 is not 32-bit integer");

    channel.send("27").unwrap();
    assert_eq!(channel.receive().unwrap(), "The cube root of 27 is 3.000000.");

    drop(channel);
    server.stop();
}

#[test]
fn test_pipelined_requests_answered_in_order() {
    let server = TestServer::start(test_config());
    let mut channel = server.channel();

    for req in ["1", "x", "64"] {
        channel.send(req).unwrap();
    }
    assert_eq!(channel.receive().unwrap(), "The cube root of 1 is 1.000000.");
    assert_eq!(channel.receive().unwrap(), "\"x\" is not integer");
    assert_eq!(channel.receive().unwrap(), "The cube root of 64 is 4.000000.");

    drop(channel);
    server.stop();
}

// =============================================================================
// Client Tests
// =============================================================================

#[test]
fn test_client_exchange() {
    let server = TestServer::start(test_config());
    let mut client = Client::connect(1, &server.client_config()).unwrap();

    let exchange = client.exchange(&[8, -8, 1000]);

    assert!(exchange.is_complete(3));
    assert_eq!(exchange.responses[0], "The cube root of 8 is 2.000000.");
    assert_eq!(exchange.responses[1], "The cube root of -8 is -2.000000.");
    assert_eq!(exchange.responses[2], "The cube root of 1000 is 10.000000.");

    drop(client);
    server.stop();
}

#[test]
fn test_client_run_sends_configured_count() {
    let server = TestServer::start(test_config());
    let mut config = server.client_config();
    config.request_count = 7;
    let mut client = Client::connect(2, &config).unwrap();

    let exchange = client.run();

    assert!(exchange.is_complete(7));
    for response in &exchange.responses {
        assert!(response.starts_with("The cube root of "), "{}", response);
    }

    drop(client);
    server.stop();
}

#[test]
fn test_client_connect_failure() {
    // Bind then drop to get a port nothing listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = Config::builder()
        .addr(addr.to_string())
        .connect_timeout_ms(500)
        .build();

    let result = Client::connect(1, &config);
    assert!(matches!(result, Err(WireError::Io(_))));
}

#[test]
fn test_client_keeps_sending_after_write_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = test_config();
    config.addr = listener.local_addr().unwrap().to_string();

    let mut client = Client::connect(4, &config).unwrap();

    // Peer goes away without reading: the first write draws a reset, later
    // writes fail
    let (peer, _) = listener.accept().unwrap();
    drop(peer);
    thread::sleep(Duration::from_millis(50));

    let requests = [8; 50];
    let exchange = client.exchange(&requests);

    assert!(exchange.failed > 0, "no write failed: {:?}", exchange);
    assert_eq!(exchange.sent + exchange.failed, requests.len());
    assert!(exchange.responses.is_empty());
}

#[test]
fn test_client_stops_reading_when_server_goes_away() {
    let server = TestServer::start(test_config());
    let mut client = Client::connect(3, &server.client_config()).unwrap();
    wait_for(|| server.handle.active_connections() == 1);

    server.stop();

    let exchange = client.exchange(&[8, 27]);
    assert!(exchange.responses.len() < 2);
}

#[test]
fn test_concurrent_connections_no_cross_talk() {
    let server = TestServer::start(test_config());
    let config = server.client_config();

    let workers: Vec<_> = (0..8u64)
        .map(|i| {
            let config = config.clone();
            thread::spawn(move || {
                let tag = (i as i32 + 1) * 1000;
                let mut client = Client::connect(i + 1, &config).unwrap();
                let exchange = client.exchange(&[tag; 5]);
                (tag, exchange)
            })
        })
        .collect();

    for worker in workers {
        let (tag, exchange) = worker.join().unwrap();
        assert!(exchange.is_complete(5));
        let expected = format!("The cube root of {} is ", tag);
        for response in &exchange.responses {
            assert!(response.starts_with(&expected), "{} vs {}", response, expected);
        }
    }

    server.stop();
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_idle_connection_closed_after_read_timeout() {
    let config = Config::builder()
        .addr("127.0.0.1:0")
        .accept_poll_ms(10)
        .read_timeout_ms(100)
        .build();
    let server = TestServer::start(config);
    let mut channel = server.channel();

    let result = channel.receive();
    assert!(matches!(result, Err(WireError::EndOfStream)));
    wait_for(|| server.handle.active_connections() == 0);

    server.stop();
}

#[test]
fn test_read_deadline_rearmed_per_request() {
    let config = Config::builder()
        .addr("127.0.0.1:0")
        .accept_poll_ms(10)
        .read_timeout_ms(300)
        .build();
    let server = TestServer::start(config);
    let mut channel = server.channel();

    // Total time exceeds one deadline, but each gap is shorter than it
    for _ in 0..3 {
        thread::sleep(Duration::from_millis(150));
        channel.send("8").unwrap();
        assert_eq!(channel.receive().unwrap(), "The cube root of 8 is 2.000000.");
    }

    drop(channel);
    server.stop();
}

#[test]
fn test_read_deadline_bounds_whole_request() {
    let config = Config::builder()
        .addr("127.0.0.1:0")
        .accept_poll_ms(10)
        .read_timeout_ms(300)
        .build();
    let server = TestServer::start(config);
    let mut stream = TcpStream::connect(server.addr).unwrap();
    let reader = stream.try_clone().unwrap();
    wait_for(|| server.handle.active_connections() == 1);

    // One byte every 200ms: never idle for 300ms, but far past it overall
    let started = Instant::now();
    for &b in b"12345678\t" {
        thread::sleep(Duration::from_millis(200));
        if stream.write_all(&[b]).is_err() {
            break;
        }
    }

    let mut channel = Channel::new(reader, DEFAULT_DELIMITER);
    channel
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    assert!(channel.receive().is_err(), "request past the deadline was answered");

    // The handler gave up long before the trickle finished
    wait_for(|| server.handle.active_connections() == 0);
    assert!(started.elapsed() < Duration::from_secs(5));

    server.stop();
}

#[test]
fn test_connection_limit() {
    let mut config = test_config();
    config.max_connections = 1;
    let server = TestServer::start(config);

    let mut first = server.channel();
    wait_for(|| server.handle.active_connections() == 1);

    let mut second = server.channel();
    assert!(matches!(second.receive(), Err(WireError::EndOfStream)));

    first.send("8").unwrap();
    assert_eq!(first.receive().unwrap(), "The cube root of 8 is 2.000000.");

    drop(first);
    server.stop();
}

#[test]
fn test_shutdown_drains_idle_handlers() {
    let server = TestServer::start(test_config());
    let mut a = server.channel();
    let mut b = server.channel();
    wait_for(|| server.handle.active_connections() == 2);

    let handle = server.handle.clone();
    let started = Instant::now();
    server.stop();

    // Default read deadline is 10s; draining must not wait for it
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(handle.is_shutdown());
    assert_eq!(handle.active_connections(), 0);
    assert!(matches!(a.receive(), Err(WireError::EndOfStream)));
    assert!(matches!(b.receive(), Err(WireError::EndOfStream)));
}

#[test]
fn test_handler_closes_after_failed_reply() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut client = Channel::new(
        TcpStream::connect(listener.local_addr().unwrap()).unwrap(),
        DEFAULT_DELIMITER,
    );
    let (stream, _) = listener.accept().unwrap();

    // Reads still work, every write fails
    stream.shutdown(Shutdown::Write).unwrap();
    let connection = Connection::new(
        1,
        stream,
        DEFAULT_DELIMITER,
        Duration::from_secs(5),
        ShutdownSignal::new(),
    )
    .unwrap();
    let handler = thread::spawn(move || connection.handle());

    client.send("8").unwrap();

    assert_eq!(handler.join().unwrap(), CloseReason::WriteFailed);
}

#[test]
fn test_handler_reports_peer_close() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (stream, _) = listener.accept().unwrap();

    let connection = Connection::new(
        1,
        stream,
        DEFAULT_DELIMITER,
        Duration::from_secs(5),
        ShutdownSignal::new(),
    )
    .unwrap();
    let handler = thread::spawn(move || connection.handle());

    client.shutdown(Shutdown::Write).unwrap();
    assert_eq!(handler.join().unwrap(), CloseReason::PeerClosed);
}

#[test]
fn test_bind_rejects_payload_delimiter() {
    let config = Config::builder()
        .addr("127.0.0.1:0")
        .delimiter(b'.')
        .build();
    assert!(matches!(Server::bind(config), Err(WireError::Config(_))));
}

#[test]
fn test_bind_rejects_invalid_config() {
    let config = Config::builder()
        .addr("127.0.0.1:0")
        .request_count(0)
        .build();
    assert!(matches!(Server::bind(config), Err(WireError::Config(_))));
}
