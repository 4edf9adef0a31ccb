//! Protocol module - wire format, checksum, framing and decoding.
//!
//! This module implements the binary protocol spoken over the serial link:
//! - fixed sentinels and command codes
//! - the running XOR checksum
//! - outbound frame encoding
//! - the resynchronizing decoder for inbound bytes

mod checksum;
mod decoder;
mod frame;
mod wire_format;

pub use checksum::checksum;
pub use decoder::{DecoderStats, FrameDecoder};
pub use frame::{encode_frame, encode_frame_into, Frame};
pub use wire_format::{
    commands, expected_payload_len, frame_size, FOOTER_BYTE, FRAME_OVERHEAD, HEADER_BYTE,
    MAX_PAYLOAD_SIZE, THERMAL_GRID_SIZE, THERMAL_PAYLOAD_SIZE, TRAILER_SIZE,
};
