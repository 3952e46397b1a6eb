//! Receive buffer
//!
//! Accumulates bytes from a stream socket and hands out complete ISCP
//! messages, so partial packets survive between reads.

use bytes::BytesMut;

use super::codec::{decode_header, HEADER_SIZE};
use super::message;
use crate::config::DEFAULT_BUFFER_CAPACITY;
use crate::error::{EiscpError, Result};

/// Bounded accumulator of received eISCP packets
///
/// `receive` does not enforce the bound itself; callers read at most
/// [`MessageBuffer::available`] bytes from the socket per call.
#[derive(Debug)]
pub struct MessageBuffer {
    /// Bytes received but not yet consumed as messages
    buf: BytesMut,

    /// Upper bound on buffered bytes
    capacity: usize,
}

impl MessageBuffer {
    /// Create an empty buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Bytes that can still be received without exceeding capacity
    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.buf.len())
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append received bytes
    pub fn receive(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Extract the next complete message, if one is buffered
    ///
    /// Yields at most one message per call; call repeatedly to drain.
    /// A Framing error leaves the buffer desynchronized and the caller
    /// should [`reset`](Self::reset) it.
    pub fn next_message(&mut self) -> Result<Option<String>> {
        if self.buf.len() < HEADER_SIZE {
            return Ok(None);
        }

        let header = decode_header(&self.buf)?;
        let frame_size = header.frame_size();

        if frame_size > self.capacity {
            return Err(EiscpError::Framing(format!(
                "Frame of {} bytes exceeds buffer capacity of {}",
                frame_size, self.capacity
            )));
        }

        if self.buf.len() < frame_size {
            return Ok(None);
        }

        // Consume the frame before decoding so a bad payload does not
        // wedge the stream
        let frame = self.buf.split_to(frame_size);
        message::unwrap(&frame[HEADER_SIZE..]).map(Some)
    }

    /// Drop all buffered bytes
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::encode;

    fn stream_of(bodies: &[&str]) -> Vec<u8> {
        bodies.iter().flat_map(|b| encode(b).to_vec()).collect()
    }

    fn drain(buffer: &mut MessageBuffer) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(msg) = buffer.next_message().unwrap() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_single_message() {
        let mut buffer = MessageBuffer::default();
        buffer.receive(&encode("PWR01"));

        assert_eq!(buffer.next_message().unwrap(), Some("PWR01".to_string()));
        assert_eq!(buffer.next_message().unwrap(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_one_message_per_call() {
        let mut buffer = MessageBuffer::default();
        buffer.receive(&stream_of(&["PWR01", "MVL20", "AMT00"]));

        assert_eq!(buffer.next_message().unwrap().as_deref(), Some("PWR01"));
        assert_eq!(buffer.next_message().unwrap().as_deref(), Some("MVL20"));
        assert_eq!(buffer.next_message().unwrap().as_deref(), Some("AMT00"));
        assert_eq!(buffer.next_message().unwrap(), None);
    }

    #[test]
    fn test_partial_header_and_payload() {
        let packet = encode("SLI10");
        let mut buffer = MessageBuffer::default();

        buffer.receive(&packet[..10]);
        assert_eq!(buffer.next_message().unwrap(), None);

        buffer.receive(&packet[10..20]);
        assert_eq!(buffer.next_message().unwrap(), None);

        buffer.receive(&packet[20..]);
        assert_eq!(buffer.next_message().unwrap().as_deref(), Some("SLI10"));
    }

    #[test]
    fn test_any_split_point_yields_same_messages() {
        let bodies = ["PWR01", "MVL2A", "NLSC0P", "SWL+03"];
        let wire = stream_of(&bodies);

        for split in 0..=wire.len() {
            let mut buffer = MessageBuffer::default();
            let mut seen = Vec::new();

            buffer.receive(&wire[..split]);
            seen.extend(drain(&mut buffer));
            buffer.receive(&wire[split..]);
            seen.extend(drain(&mut buffer));

            assert_eq!(seen, bodies, "split at {}", split);
        }
    }

    #[test]
    fn test_byte_by_byte() {
        let bodies = ["PWR01", "AMT01"];
        let wire = stream_of(&bodies);
        let mut buffer = MessageBuffer::default();
        let mut seen = Vec::new();

        for byte in wire {
            buffer.receive(&[byte]);
            seen.extend(drain(&mut buffer));
        }

        assert_eq!(seen, bodies);
    }

    #[test]
    fn test_available_and_reset() {
        let mut buffer = MessageBuffer::new(64);
        assert_eq!(buffer.available(), 64);

        buffer.receive(&[0u8; 10]);
        assert_eq!(buffer.available(), 54);

        buffer.reset();
        assert_eq!(buffer.available(), 64);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_bad_magic_is_framing_error() {
        let mut buffer = MessageBuffer::default();
        buffer.receive(&[0xFFu8; 20]);

        assert!(matches!(buffer.next_message(), Err(EiscpError::Framing(_))));
    }

    #[test]
    fn test_oversized_frame_is_framing_error() {
        let mut buffer = MessageBuffer::new(32);
        buffer.receive(&encode("NRI<very long document that will not fit>"));

        assert!(matches!(buffer.next_message(), Err(EiscpError::Framing(_))));
    }

    #[test]
    fn test_bad_payload_is_consumed() {
        let mut wire = Vec::new();
        let mut bad = BytesMut::new();
        crate::protocol::codec::encode_packet(b"XXPWR01\x1a", &mut bad);
        wire.extend_from_slice(&bad);
        wire.extend_from_slice(&encode("PWR00"));

        let mut buffer = MessageBuffer::default();
        buffer.receive(&wire);

        assert!(buffer.next_message().is_err());
        assert_eq!(buffer.next_message().unwrap().as_deref(), Some("PWR00"));
    }
}
