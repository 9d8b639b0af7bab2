//! Configuration for tabwire
//!
//! Centralized configuration with sensible defaults.

use crate::error::{Result, WireError};

/// Main configuration shared by the server and the client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP address (host:port) the server listens on and the client dials
    pub addr: String,

    /// Frame terminator byte
    pub delimiter: u8,

    // -------------------------------------------------------------------------
    // Server Configuration
    // -------------------------------------------------------------------------
    /// Per-connection read deadline, re-armed before every receive (milliseconds)
    pub read_timeout_ms: u64,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// How often the accept loop checks for shutdown (milliseconds)
    pub accept_poll_ms: u64,

    // -------------------------------------------------------------------------
    // Client Configuration
    // -------------------------------------------------------------------------
    /// Dial timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Write deadline armed before the request batch (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// Read deadline for each response (milliseconds, 0 = none)
    pub client_read_timeout_ms: u64,

    /// Pause between connecting and sending the first request (milliseconds)
    pub settle_delay_ms: u64,

    /// Number of requests per client run
    pub request_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8001".to_string(),
            delimiter: b'\t',
            read_timeout_ms: 10_000,
            max_connections: 1024,
            accept_poll_ms: 50,
            connect_timeout_ms: 2_000,
            // Very tight; raise it for anything but loopback
            write_timeout_ms: 5,
            client_read_timeout_ms: 10_000,
            settle_delay_ms: 200,
            request_count: 5,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the server or client cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() {
            return Err(WireError::Config(format!(
                "delimiter 0x{:02x} is not an ASCII byte",
                self.delimiter
            )));
        }
        if can_appear_in_payload(self.delimiter) {
            return Err(WireError::Config(format!(
                "delimiter {:?} can appear inside requests or replies",
                self.delimiter as char
            )));
        }
        if self.request_count == 0 {
            return Err(WireError::Config(
                "request_count must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(WireError::Config(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(WireError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bytes that decimal requests, cube-root replies or validation errors use
fn can_appear_in_payload(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'+' | b'.' | b' ' | b'"')
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP address
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.config.addr = addr.into();
        self
    }

    /// Set the frame delimiter byte
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Set the server read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the accept loop poll interval (in milliseconds)
    pub fn accept_poll_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_ms = ms;
        self
    }

    /// Set the client connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the client write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the client read timeout (in milliseconds)
    pub fn client_read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.client_read_timeout_ms = ms;
        self
    }

    /// Set the client's pause after connecting (in milliseconds)
    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.settle_delay_ms = ms;
        self
    }

    /// Set how many requests a client run sends
    pub fn request_count(mut self, count: usize) -> Self {
        self.config.request_count = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.addr, "127.0.0.1:8001");
        assert_eq!(config.delimiter, b'\t');
        assert_eq!(config.read_timeout_ms, 10_000);
        assert_eq!(config.connect_timeout_ms, 2_000);
        assert_eq!(config.write_timeout_ms, 5);
        assert_eq!(config.settle_delay_ms, 200);
        assert_eq!(config.request_count, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_request_count() {
        let config = Config::builder().request_count(0).build();
        assert!(matches!(config.validate(), Err(WireError::Config(_))));
    }

    #[test]
    fn validate_rejects_non_ascii_delimiter() {
        let config = Config::builder().delimiter(0xC3).build();
        assert!(matches!(config.validate(), Err(WireError::Config(_))));
    }

    #[test]
    fn validate_rejects_payload_delimiter() {
        for delimiter in [b'.', b'0', b'7', b'-', b'+', b' ', b'"', b'a', b'T'] {
            let config = Config::builder().delimiter(delimiter).build();
            assert!(
                matches!(config.validate(), Err(WireError::Config(_))),
                "delimiter {:?} accepted",
                delimiter as char
            );
        }
    }

    #[test]
    fn validate_accepts_control_delimiters() {
        for delimiter in [b'\t', b'\n', b'|', 0x1F] {
            let config = Config::builder().delimiter(delimiter).build();
            assert!(config.validate().is_ok(), "delimiter 0x{:02x}", delimiter);
        }
    }
}
