//! ISCP text messages
//!
//! An ISCP message is three command characters plus parameters, wrapped
//! between a start sequence and an end-of-file byte:
//!
//! ```text
//! "!1" + body + 0x1A [+ CR | LF | CR LF]
//! ```
//!
//! `!` is the start character, `1` the destination unit type (receiver).

use crate::error::{EiscpError, Result};

/// Start sequence: start character plus unit type
pub const START: &str = "!1";

/// End-of-file byte terminating the body
pub const EOF: u8 = 0x1A;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Wrap a command body for transmission
pub fn wrap(body: &str) -> String {
    let mut text = String::with_capacity(START.len() + body.len() + 2);
    text.push_str(START);
    text.push_str(body);
    text.push(EOF as char);
    text.push('\r');
    text
}

/// Strip the ISCP envelope from a received payload
pub fn unwrap(payload: &[u8]) -> Result<String> {
    if !payload.starts_with(START.as_bytes()) {
        return Err(EiscpError::Framing(format!(
            "Missing \"{}\" start sequence in payload {:?}",
            START,
            String::from_utf8_lossy(payload)
        )));
    }

    let mut end = payload.len();

    // EOF can be followed by CR, LF or CR+LF
    for _ in 0..2 {
        if end > START.len() && matches!(payload[end - 1], CR | LF) {
            end -= 1;
        }
    }
    if end > START.len() && payload[end - 1] == EOF {
        end -= 1;
    }

    std::str::from_utf8(&payload[START.len()..end])
        .map(str::to_string)
        .map_err(|e| EiscpError::Framing(format!("Payload is not valid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("PWR01"), "!1PWR01\u{1a}\r");
    }

    #[test]
    fn test_unwrap_terminators() {
        assert_eq!(unwrap(b"!1PWR01\x1a").unwrap(), "PWR01");
        assert_eq!(unwrap(b"!1PWR01\x1a\r").unwrap(), "PWR01");
        assert_eq!(unwrap(b"!1PWR01\x1a\n").unwrap(), "PWR01");
        assert_eq!(unwrap(b"!1PWR01\x1a\r\n").unwrap(), "PWR01");
    }

    #[test]
    fn test_unwrap_missing_start() {
        assert!(matches!(unwrap(b"PWR01\x1a"), Err(EiscpError::Framing(_))));
        assert!(matches!(unwrap(b""), Err(EiscpError::Framing(_))));
    }

    #[test]
    fn test_unwrap_empty_body() {
        assert_eq!(unwrap(b"!1\x1a\r\n").unwrap(), "");
        assert_eq!(unwrap(b"!1").unwrap(), "");
    }

    #[test]
    fn test_unwrap_keeps_inner_carriage_returns() {
        assert_eq!(unwrap(b"!1NLSa\rb\x1a\r\n").unwrap(), "NLSa\rb");
    }
}
