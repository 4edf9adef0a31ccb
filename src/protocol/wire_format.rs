//! Wire format constants.
//!
//! Every frame on the link has the same layout:
//! ```text
//! ┌────────┬─────────┬────────┬─────────────┬──────────┬────────┐
//! │ Header │ Command │ Length │ Payload     │ Checksum │ Footer │
//! │ 0xA5   │ 1 byte  │ 1 byte │ 0-255 bytes │ 1 byte   │ 0x5A   │
//! └────────┴─────────┴────────┴─────────────┴──────────┴────────┘
//! ```
//!
//! The checksum is the XOR of header, command, length and every payload byte.
//! Multi-byte payload values are Big Endian.

/// Frame start sentinel.
pub const HEADER_BYTE: u8 = 0xA5;

/// Frame end sentinel.
pub const FOOTER_BYTE: u8 = 0x5A;

/// Maximum payload size in bytes (the length field is a single byte).
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// Bytes a frame carries besides its payload (header, command, length, checksum, footer).
pub const FRAME_OVERHEAD: usize = 5;

/// Bytes that follow the payload (checksum + footer).
pub const TRAILER_SIZE: usize = 2;

/// Thermal array dimension (rows and columns).
pub const THERMAL_GRID_SIZE: usize = 8;

/// Payload size of a thermal frame report: 64 samples of 2 bytes.
pub const THERMAL_PAYLOAD_SIZE: usize = THERMAL_GRID_SIZE * THERMAL_GRID_SIZE * 2;

/// Command codes understood by the sensor board.
pub mod commands {
    /// NFC UID report (device → host), variable length.
    pub const NFC_UID: u8 = 0x01;
    /// Request a thermal capture (host → device), empty payload.
    pub const THERMAL_CAPTURE: u8 = 0x10;
    /// Thermal frame report (device → host), 128-byte payload.
    pub const THERMAL_FRAME: u8 = 0x11;

    /// Check if the command code is one the protocol defines.
    #[inline]
    pub fn is_known(command: u8) -> bool {
        matches!(command, NFC_UID | THERMAL_CAPTURE | THERMAL_FRAME)
    }
}

/// Payload size a command requires, if it has a fixed one.
///
/// A frame whose length disagrees with this is malformed and gets discarded.
#[inline]
pub fn expected_payload_len(command: u8) -> Option<usize> {
    match command {
        commands::THERMAL_FRAME => Some(THERMAL_PAYLOAD_SIZE),
        _ => None,
    }
}

/// Total encoded size of a frame carrying `payload_len` bytes.
#[inline]
pub fn frame_size(payload_len: usize) -> usize {
    FRAME_OVERHEAD + payload_len
}
