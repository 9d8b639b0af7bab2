//! Connection Handler
//!
//! Runs the per-connection state machine:
//!
//! ```text
//! AwaitingRequest ──► Validating ──► Computing ──► Responding ──┐
//!       ▲                 │                                     │
//!       │                 └── (invalid: send error text) ───────┤
//!       └───────────────────────────────────────────────────────┘
//!
//! any receive/send failure, end-of-stream or shutdown ──► Closed
//! ```

use std::net::TcpStream;
use std::time::{Duration, Instant};

use crate::compute::cube_root;
use crate::error::{Result, WireError};
use crate::network::supervisor::ShutdownSignal;
use crate::protocol::{format_cube_root, parse_request, Channel};

/// Why a handler reached `Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client closed its end
    PeerClosed,
    /// No request arrived before the read deadline
    Timeout,
    /// The server is shutting down
    Shutdown,
    /// Receiving failed with a transport error
    ReadFailed,
    /// Sending failed; the stream may hold a torn frame
    WriteFailed,
}

enum State {
    AwaitingRequest,
    Validating(String),
    Computing(i32),
    Responding(String),
    Closed(CloseReason),
}

/// Handles a single client connection
pub struct Connection {
    /// Handler id, assigned by the accept loop
    id: u64,

    channel: Channel,

    /// Bound on each whole receive, measured from when it starts
    read_timeout: Duration,

    shutdown: ShutdownSignal,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(
        id: u64,
        stream: TcpStream,
        delimiter: u8,
        read_timeout: Duration,
        shutdown: ShutdownSignal,
    ) -> Result<Self> {
        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let channel = Channel::new(stream, delimiter);
        let peer_addr = channel
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(Self {
            id,
            channel,
            read_timeout,
            shutdown,
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns once the state machine reaches `Closed`; the socket is released
    /// when `self` is dropped.
    pub fn handle(mut self) -> CloseReason {
        tracing::debug!(
            role = "server",
            id = self.id,
            peer = %self.peer_addr,
            "handler started"
        );

        let mut state = State::AwaitingRequest;
        loop {
            state = match state {
                State::AwaitingRequest => self.await_request(),
                State::Validating(text) => match parse_request(&text) {
                    Ok(n) => State::Computing(n),
                    Err(e) => self.reply(&e.to_string(), "error message"),
                },
                State::Computing(n) => State::Responding(format_cube_root(n, cube_root(n))),
                State::Responding(message) => self.reply(&message, "response"),
                State::Closed(reason) => {
                    tracing::debug!(
                        role = "server",
                        id = self.id,
                        peer = %self.peer_addr,
                        ?reason,
                        "handler closed"
                    );
                    return reason;
                }
            };
        }
    }

    fn await_request(&mut self) -> State {
        if self.shutdown.is_triggered() {
            return State::Closed(CloseReason::Shutdown);
        }

        // A zero timeout means wait indefinitely
        let received = if self.read_timeout.is_zero() {
            self.channel
                .set_read_timeout(None)
                .and_then(|_| self.channel.receive())
        } else {
            self.channel.receive_until(Instant::now() + self.read_timeout)
        };

        match received {
            Ok(text) => {
                tracing::info!(role = "server", id = self.id, request = %text, "received request");
                State::Validating(text)
            }
            // close_all() during shutdown surfaces here as end-of-stream
            Err(_) if self.shutdown.is_triggered() => State::Closed(CloseReason::Shutdown),
            Err(WireError::EndOfStream) => {
                tracing::info!(
                    role = "server",
                    id = self.id,
                    "the connection is closed by another side"
                );
                State::Closed(CloseReason::PeerClosed)
            }
            Err(e) if e.is_timeout() => {
                tracing::info!(role = "server", id = self.id, "read deadline expired");
                State::Closed(CloseReason::Timeout)
            }
            Err(e) if e.is_disconnect() => {
                tracing::info!(role = "server", id = self.id, error = %e, "client disconnected");
                State::Closed(CloseReason::PeerClosed)
            }
            Err(e) => {
                tracing::warn!(role = "server", id = self.id, error = %e, "read error");
                State::Closed(CloseReason::ReadFailed)
            }
        }
    }

    /// Send `message` and go back to waiting, or close if the send failed
    fn reply(&mut self, message: &str, kind: &'static str) -> State {
        match self.channel.send(message) {
            Ok(bytes) => {
                tracing::info!(
                    role = "server",
                    id = self.id,
                    bytes,
                    kind,
                    text = message,
                    "sent"
                );
                State::AwaitingRequest
            }
            Err(e) => {
                tracing::warn!(role = "server", id = self.id, error = %e, kind, "write error");
                State::Closed(CloseReason::WriteFailed)
            }
        }
    }
}
