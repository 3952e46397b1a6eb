//! Packet codec
//!
//! Encoding and decoding functions for the eISCP wire format.
//!
//! ## Wire Format
//!
//! ```text
//! ┌──────────┬────────────┬─────────────┬─────────┬──────────────┬──────────┐
//! │ "ISCP"(4)│ HdrLen (4) │ DataLen (4) │ Ver (1) │ Reserved (3) │ Payload  │
//! └──────────┴────────────┴─────────────┴─────────┴──────────────┴──────────┘
//! ```
//!
//! All integers are big-endian. The header length is always 16 and the
//! version is always 1.

use std::io::Write;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::message;
use crate::error::{EiscpError, Result};

/// Magic bytes at the start of every packet
pub const MAGIC: [u8; 4] = *b"ISCP";

/// Header size: magic (4) + header length (4) + payload length (4) + version (1) + reserved (3)
pub const HEADER_SIZE: usize = 16;

/// The only supported header version
pub const VERSION: u8 = 0x01;

/// A decoded packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Header length field (always 16)
    pub header_size: u32,

    /// Length of the payload following the header
    pub payload_size: u32,

    /// Protocol version
    pub version: u8,

    /// Reserved bytes, zero on send
    pub reserved: [u8; 3],
}

impl Header {
    /// Total size of the frame described by this header
    pub fn frame_size(&self) -> usize {
        HEADER_SIZE + self.payload_size as usize
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Append a packet carrying `payload` to `dst`
pub fn encode_packet(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32(HEADER_SIZE as u32);
    dst.put_u32(payload.len() as u32);
    dst.put_u8(VERSION);
    dst.put_slice(&[0x00, 0x00, 0x00]);
    dst.put_slice(payload);
}

/// Encode an ISCP command body (e.g. `PWR01`) into a complete packet
///
/// The body is wrapped as `"!1" + body + EOF + "\r"` before framing.
pub fn encode(body: &str) -> Bytes {
    let text = message::wrap(body);
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + text.len());
    encode_packet(text.as_bytes(), &mut buf);
    buf.freeze()
}

/// Encode a raw datagram payload without ISCP wrapping
///
/// Discovery queries (`!xECNQSTN`) already carry their own start
/// characters and are sent this way.
pub fn encode_raw(text: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + text.len());
    encode_packet(text.as_bytes(), &mut buf);
    buf.freeze()
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode the 16-byte header at the start of `bytes`
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    if bytes.len() < HEADER_SIZE {
        return Err(EiscpError::Framing(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut buf = &bytes[..HEADER_SIZE];

    let mut magic = [0u8; 4];
    buf.copy_to_slice(&mut magic);
    if magic != MAGIC {
        return Err(EiscpError::Framing(format!(
            "Invalid magic: {:02x?} (expected \"ISCP\")",
            magic
        )));
    }

    let header_size = buf.get_u32();
    if header_size as usize != HEADER_SIZE {
        return Err(EiscpError::Framing(format!(
            "Invalid header length: {} (expected {})",
            header_size, HEADER_SIZE
        )));
    }

    let payload_size = buf.get_u32();
    let version = buf.get_u8();
    let mut reserved = [0u8; 3];
    buf.copy_to_slice(&mut reserved);

    Ok(Header {
        header_size,
        payload_size,
        version,
        reserved,
    })
}

/// Decode a single self-contained packet (one UDP datagram)
///
/// Returns the payload text as-is, without ISCP unwrapping.
pub fn parse_one(datagram: &[u8]) -> Result<String> {
    let header = decode_header(datagram)?;

    if datagram.len() < header.frame_size() {
        return Err(EiscpError::Framing(format!(
            "Incomplete payload: expected {} bytes, got {}",
            header.frame_size(),
            datagram.len()
        )));
    }

    let payload = &datagram[HEADER_SIZE..header.frame_size()];
    String::from_utf8(payload.to_vec())
        .map_err(|e| EiscpError::Framing(format!("Payload is not valid UTF-8: {}", e)))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write an encoded command to a stream
pub fn write_message<W: Write>(writer: &mut W, body: &str) -> Result<()> {
    let bytes = encode(body);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
