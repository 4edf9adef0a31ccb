//! Frame struct and outbound frame encoding.
//!
//! A [`Frame`] is what the decoder hands out once header, length, checksum
//! and footer have all checked out. It holds only the command code and the
//! payload; the sentinels and checksum are wire details.
//!
//! # Example
//!
//! ```
//! use sensorlink::protocol::{encode_frame, commands};
//!
//! let bytes = encode_frame(commands::NFC_UID, &[0x11, 0x22]).unwrap();
//! assert_eq!(bytes, vec![0xA5, 0x01, 0x02, 0x11, 0x22, 0x95, 0x5A]);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::checksum::checksum;
use super::wire_format::{commands, frame_size, FOOTER_BYTE, HEADER_BYTE, MAX_PAYLOAD_SIZE};
use crate::error::{LinkError, Result};

/// A validated protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command code.
    pub command: u8,
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from a command and payload.
    pub fn new(command: u8, payload: Bytes) -> Self {
        Self { command, payload }
    }

    /// Create a frame from a command and raw bytes (copies data).
    pub fn from_parts(command: u8, payload: &[u8]) -> Self {
        Self {
            command,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    /// Get the command code.
    #[inline]
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the command code is one the protocol defines.
    #[inline]
    pub fn is_known(&self) -> bool {
        commands::is_known(self.command)
    }

    /// Encode this frame to its wire representation.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_frame(self.command, &self.payload)
    }
}

/// Build a complete frame as a single byte vector.
///
/// Fails with [`LinkError::PayloadTooLarge`] when the payload does not fit
/// the one-byte length field. The command code is not checked.
pub fn encode_frame(command: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let mut buf = BytesMut::with_capacity(frame_size(payload.len()));
    encode_frame_into(&mut buf, command, payload)?;
    Ok(buf.to_vec())
}

/// Append an encoded frame to an existing buffer.
///
/// Nothing is written when the payload is too large.
pub fn encode_frame_into<B: BufMut>(buf: &mut B, command: u8, payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(LinkError::PayloadTooLarge { len: payload.len() });
    }
    let length = payload.len() as u8;

    buf.put_u8(HEADER_BYTE);
    buf.put_u8(command);
    buf.put_u8(length);
    buf.put_slice(payload);
    buf.put_u8(checksum(HEADER_BYTE, command, length, payload));
    buf.put_u8(FOOTER_BYTE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let bytes = encode_frame(0x01, &[0xDE, 0xAD]).unwrap();

        assert_eq!(bytes.len(), 7);
        assert_eq!(bytes[0], HEADER_BYTE);
        assert_eq!(bytes[1], 0x01);
        assert_eq!(bytes[2], 2);
        assert_eq!(&bytes[3..5], &[0xDE, 0xAD]);
        assert_eq!(bytes[5], 0xA5 ^ 0x01 ^ 0x02 ^ 0xDE ^ 0xAD);
        assert_eq!(bytes[6], FOOTER_BYTE);
    }

    #[test]
    fn test_encode_thermal_capture_request() {
        let bytes = encode_frame(commands::THERMAL_CAPTURE, &[]).unwrap();
        assert_eq!(bytes, vec![0xA5, 0x10, 0x00, 0xB5, 0x5A]);
    }

    #[test]
    fn test_encode_max_payload() {
        let payload = vec![0x01; MAX_PAYLOAD_SIZE];
        let bytes = encode_frame(0x42, &payload).unwrap();
        assert_eq!(bytes.len(), frame_size(MAX_PAYLOAD_SIZE));
        assert_eq!(bytes[2], 255);
    }

    #[test]
    fn test_payload_too_large() {
        let payload = vec![0u8; MAX_PAYLOAD_SIZE + 1];
        let result = encode_frame(0x01, &payload);
        assert!(matches!(result, Err(LinkError::PayloadTooLarge { len: 256 })));
    }

    #[test]
    fn test_encode_into_leaves_buffer_untouched_on_error() {
        let mut buf = BytesMut::new();
        let payload = vec![0u8; 300];
        assert!(encode_frame_into(&mut buf, 0x01, &payload).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::from_parts(0x42, &[1, 2, 3]);
        assert_eq!(frame.command(), 0x42);
        assert_eq!(frame.payload(), &[1, 2, 3]);
        assert_eq!(frame.payload_len(), 3);
        assert!(!frame.is_known());
        assert_eq!(frame.encode().unwrap(), encode_frame(0x42, &[1, 2, 3]).unwrap());
    }
}
