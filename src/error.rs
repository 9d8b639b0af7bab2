//! Error types for tabwire
//!
//! Provides a unified error type for transport and framing operations, plus
//! the request validation error that is reported back to the peer.

use thiserror::Error;

/// Result type alias using WireError
pub type Result<T> = std::result::Result<T, WireError>;

/// Unified error type for tabwire operations
#[derive(Debug, Error)]
pub enum WireError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed its end before a full frame arrived
    #[error("connection closed by peer")]
    EndOfStream,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WireError {
    /// True when a read or write deadline expired.
    ///
    /// Unix reports an expired socket timeout as `WouldBlock`, Windows as
    /// `TimedOut`.
    pub fn is_timeout(&self) -> bool {
        match self {
            WireError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// True when the peer went away, cleanly or not
    pub fn is_disconnect(&self) -> bool {
        match self {
            WireError::EndOfStream => true,
            WireError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// A request that could not be turned into a signed 32-bit integer.
///
/// The `Display` text is what the server sends back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("\"{0}\" is not integer")]
    NotInteger(String),

    #[error("{0} is not 32-bit integer")]
    OutOfRange(i64),
}
