//! Request parsing
//!
//! Turns a received message into the integer argument for the numeric engine.

use crate::error::ValidationError;

/// Parse a request as a signed 32-bit decimal integer
///
/// Text that is not a (64-bit) decimal integer is `NotInteger`; an integer
/// outside the `i32` range is `OutOfRange` and carries the parsed value.
pub fn parse_request(text: &str) -> Result<i32, ValidationError> {
    let wide: i64 = text
        .parse()
        .map_err(|_| ValidationError::NotInteger(text.to_string()))?;

    i32::try_from(wide).map_err(|_| ValidationError::OutOfRange(wide))
}
