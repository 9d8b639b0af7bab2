//! Framed channel
//!
//! Converts between a raw byte stream and discrete text messages using a
//! single-byte terminator.

use std::io::{self, BufRead, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use bytes::{BufMut, BytesMut};

use crate::error::{Result, WireError};

/// Default frame terminator (tab)
pub const DEFAULT_DELIMITER: u8 = b'\t';

/// Initial capacity for the receive accumulator
const RECEIVE_CAPACITY: usize = 64;

// =============================================================================
// Frame Encoding
// =============================================================================

/// Build the on-wire frame for `text`: payload bytes followed by the delimiter
///
/// Fails if the payload already contains the delimiter, since the receiver
/// would split it into two messages.
pub fn encode_frame(text: &str, delimiter: u8) -> Result<BytesMut> {
    if text.as_bytes().contains(&delimiter) {
        return Err(WireError::Protocol(format!(
            "payload contains delimiter byte 0x{:02x}",
            delimiter
        )));
    }

    let mut frame = BytesMut::with_capacity(text.len() + 1);
    frame.put_slice(text.as_bytes());
    frame.put_u8(delimiter);
    Ok(frame)
}

// =============================================================================
// Stream-based I/O
// =============================================================================

/// Write one message to a stream
///
/// The whole frame goes out in a single write. Returns the number of bytes
/// written, delimiter included. A failed write leaves the stream in an unknown
/// framing state; callers should stop using it.
pub fn send_message<W: Write>(writer: &mut W, text: &str, delimiter: u8) -> Result<usize> {
    let frame = encode_frame(text, delimiter)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(frame.len())
}

/// Read one message from a stream, one byte at a time
///
/// Blocks until the delimiter arrives. The delimiter is not part of the
/// returned text. A peer close before the delimiter yields
/// [`WireError::EndOfStream`]; any other transport error (including an expired
/// read timeout) is returned unchanged.
pub fn receive_message<R: Read>(reader: &mut R, delimiter: u8) -> Result<String> {
    read_frame(reader, delimiter, || Ok(()))
}

/// Byte-at-a-time frame reader; `before_read` runs ahead of every `read()`
fn read_frame<R, F>(reader: &mut R, delimiter: u8, mut before_read: F) -> Result<String>
where
    R: Read,
    F: FnMut() -> Result<()>,
{
    let mut buffer = BytesMut::with_capacity(RECEIVE_CAPACITY);
    let mut byte = [0u8; 1];

    loop {
        before_read()?;
        match reader.read(&mut byte) {
            Ok(0) => return Err(WireError::EndOfStream),
            Ok(_) => {
                if byte[0] == delimiter {
                    break;
                }
                buffer.put_u8(byte[0]);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(WireError::Io(e)),
        }
    }

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Read one message from a buffered stream with a single delimiter scan
///
/// Same contract as [`receive_message`], without a syscall per byte.
pub fn receive_message_buffered<R: BufRead>(reader: &mut R, delimiter: u8) -> Result<String> {
    let mut buffer = Vec::with_capacity(RECEIVE_CAPACITY);
    let n = reader.read_until(delimiter, &mut buffer)?;

    if n == 0 || buffer.last() != Some(&delimiter) {
        // Stream ended mid-frame (or before it started)
        return Err(WireError::EndOfStream);
    }
    buffer.pop();

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

// =============================================================================
// Channel
// =============================================================================

/// A TCP stream speaking the delimiter-framed protocol
///
/// Owns its stream exclusively; reads go byte-at-a-time straight off the
/// socket so no bytes are ever buffered past a frame boundary.
pub struct Channel {
    stream: TcpStream,
    delimiter: u8,
}

impl Channel {
    /// Wrap an already-connected stream
    pub fn new(stream: TcpStream, delimiter: u8) -> Self {
        Self { stream, delimiter }
    }

    /// Dial `addr`, giving up after `timeout`
    pub fn connect(addr: &SocketAddr, timeout: Duration, delimiter: u8) -> Result<Self> {
        let stream = TcpStream::connect_timeout(addr, timeout)?;
        // Frames are tiny; don't let Nagle hold them back
        stream.set_nodelay(true)?;
        Ok(Self::new(stream, delimiter))
    }

    /// Send one message, returning bytes written
    pub fn send(&mut self, text: &str) -> Result<usize> {
        send_message(&mut self.stream, text, self.delimiter)
    }

    /// Receive one message, blocking for as long as the socket's read
    /// timeout allows per byte
    pub fn receive(&mut self) -> Result<String> {
        receive_message(&mut self.stream, self.delimiter)
    }

    /// Receive one message, which must be complete by `deadline`
    ///
    /// The whole frame is bounded, not each byte: the socket timeout is
    /// re-armed with the time remaining before every read. Once the deadline
    /// passes the result is an I/O error of kind `TimedOut`. Leaves the read
    /// timeout set to whatever remained at the last read.
    pub fn receive_until(&mut self, deadline: Instant) -> Result<String> {
        let stream = &self.stream;
        let mut reader = stream;
        read_frame(&mut reader, self.delimiter, || {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(WireError::Io(io::Error::new(
                    ErrorKind::TimedOut,
                    "read deadline expired",
                )));
            }
            stream.set_read_timeout(Some(remaining))?;
            Ok(())
        })
    }

    /// Set (or clear, with `None`) the read deadline
    ///
    /// A zero duration is treated as "no deadline".
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout.filter(|d| !d.is_zero()))?;
        Ok(())
    }

    /// Set (or clear, with `None`) the write deadline
    ///
    /// A zero duration is treated as "no deadline".
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_write_timeout(timeout.filter(|d| !d.is_zero()))?;
        Ok(())
    }

    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.local_addr()?)
    }
}
