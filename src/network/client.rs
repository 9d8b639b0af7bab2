//! TCP Client
//!
//! Dials the server, sends a batch of requests, then reads the same number of
//! responses back. Requests and responses pair up purely by order.

use std::net::ToSocketAddrs;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::config::Config;
use crate::error::{Result, WireError};
use crate::protocol::Channel;

/// Outcome of one request/response cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exchange {
    /// Requests that were written successfully
    pub sent: usize,

    /// Requests whose write failed and were skipped
    pub failed: usize,

    /// Responses received, in arrival order
    pub responses: Vec<String>,
}

impl Exchange {
    /// True when every request was sent and answered
    pub fn is_complete(&self, expected: usize) -> bool {
        self.sent == expected && self.responses.len() == expected
    }
}

/// A single client connection
pub struct Client {
    /// Client id for logging
    id: u64,
    channel: Channel,
    write_timeout: Duration,
    read_timeout: Duration,
    settle_delay: Duration,
    request_count: usize,
}

impl Client {
    /// Dial `config.addr` within `config.connect_timeout_ms`
    ///
    /// Every resolved address is tried in turn; the last failure is returned.
    pub fn connect(id: u64, config: &Config) -> Result<Self> {
        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let mut last_err = None;

        for addr in config.addr.to_socket_addrs()? {
            match Channel::connect(&addr, timeout, config.delimiter) {
                Ok(channel) => {
                    tracing::info!(
                        role = "client",
                        id,
                        remote = %addr,
                        local = %channel.local_addr()?,
                        "connected to server"
                    );
                    return Ok(Self {
                        id,
                        channel,
                        write_timeout: Duration::from_millis(config.write_timeout_ms),
                        read_timeout: Duration::from_millis(config.client_read_timeout_ms),
                        settle_delay: Duration::from_millis(config.settle_delay_ms),
                        request_count: config.request_count,
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            WireError::Config(format!("address {} resolved to nothing", config.addr))
        }))
    }

    /// Send `request_count` random requests and collect the replies
    pub fn run(&mut self) -> Exchange {
        let requests = random_requests(self.request_count);
        self.exchange(&requests)
    }

    /// Send `requests` in order, then read one response per request
    ///
    /// A failed send is logged and skipped. Reading stops at the first
    /// end-of-stream or error; whatever arrived before is returned. Each
    /// response must arrive within the client read timeout.
    pub fn exchange(&mut self, requests: &[i32]) -> Exchange {
        let mut outcome = Exchange::default();

        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }

        if let Err(e) = self.channel.set_write_timeout(Some(self.write_timeout)) {
            tracing::warn!(
                role = "client",
                id = self.id,
                error = %e,
                "failed to arm write deadline"
            );
        }

        for &req in requests {
            match self.channel.send(&req.to_string()) {
                Ok(bytes) => {
                    tracing::info!(
                        role = "client",
                        id = self.id,
                        bytes,
                        request = req,
                        "sent request"
                    );
                    outcome.sent += 1;
                }
                Err(e) => {
                    tracing::warn!(role = "client", id = self.id, error = %e, "write error");
                    outcome.failed += 1;
                }
            }
        }

        if self.read_timeout.is_zero() {
            if let Err(e) = self.channel.set_read_timeout(None) {
                tracing::warn!(
                    role = "client",
                    id = self.id,
                    error = %e,
                    "failed to clear read deadline"
                );
            }
        }

        for _ in 0..requests.len() {
            let received = if self.read_timeout.is_zero() {
                self.channel.receive()
            } else {
                self.channel.receive_until(Instant::now() + self.read_timeout)
            };

            match received {
                Ok(response) => {
                    tracing::info!(role = "client", id = self.id, %response, "received response");
                    outcome.responses.push(response);
                }
                Err(WireError::EndOfStream) => {
                    tracing::info!(
                        role = "client",
                        id = self.id,
                        "the connection is closed by another side"
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!(role = "client", id = self.id, error = %e, "read error");
                    break;
                }
            }
        }

        outcome
    }
}

/// `count` uniformly random request values
pub fn random_requests(count: usize) -> Vec<i32> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen::<i32>()).collect()
}
