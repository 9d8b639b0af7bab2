//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frame Format
//!
//! ```text
//! ┌─────────────────────────────────────┬───────────┐
//! │          Payload (UTF-8)            │ Delim (1) │
//! └─────────────────────────────────────┴───────────┘
//! ```
//!
//! No length prefix, no checksum, no escaping. The payload must never contain
//! the delimiter byte (`\t` by default).
//!
//! ### Request payload
//! A signed 32-bit integer in decimal, e.g. `27`.
//!
//! ### Response payload
//! - Success: `The cube root of 27 is 3.000000.`
//! - Validation failure: `"abc" is not integer` or `99999999999 is not 32-bit integer`

mod channel;
mod request;
mod response;

pub use channel::{
    encode_frame, receive_message, receive_message_buffered, send_message, Channel,
    DEFAULT_DELIMITER,
};
pub use request::parse_request;
pub use response::format_cube_root;
