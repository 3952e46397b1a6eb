//! Protocol Module
//!
//! Defines the eISCP wire protocol.
//!
//! ## Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ eISCP packet: 16-byte header + payload                   │
//! │ ┌──────────────────────────────────────────────────────┐ │
//! │ │ ISCP message: "!1" + body + EOF [+ CR/LF]            │ │
//! │ │ ┌──────────────────────────────────────────────────┐ │ │
//! │ │ │ body: 3-char prefix + value, e.g. "PWR01"        │ │ │
//! │ │ └──────────────────────────────────────────────────┘ │ │
//! │ └──────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The same framing is used over TCP (command sessions) and UDP
//! (discovery).

mod buffer;
mod codec;
mod message;

pub use buffer::MessageBuffer;
pub use codec::{
    decode_header, encode, encode_packet, encode_raw, parse_one, write_message, Header,
    HEADER_SIZE, MAGIC, VERSION,
};
pub use message::{unwrap as decode_payload, wrap, EOF, START};

/// Length of an ISCP command prefix (e.g. `PWR`)
pub const PREFIX_LEN: usize = 3;

/// The 3-character command prefix of a message body
///
/// Bodies shorter than a prefix are returned whole.
pub fn prefix_of(body: &str) -> &str {
    match body.char_indices().nth(PREFIX_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
