//! Resynchronizing frame decoder.
//!
//! Uses `bytes::BytesMut` to accumulate partial reads and a state machine to
//! walk through each frame:
//! - `SeekHeader`: drop bytes until `0xA5`
//! - `ReadCommand`: one byte
//! - `ReadLength`: one byte
//! - `AwaitPayload`: wait until payload, checksum and footer are all buffered,
//!   then validate and either emit or discard the frame
//!
//! Once the payload of a frame has been consumed its bytes are never scanned
//! again, whether the frame validated or not.
//!
//! # Example
//!
//! ```
//! use sensorlink::protocol::{encode_frame, FrameDecoder};
//!
//! let mut decoder = FrameDecoder::new();
//!
//! let mut stream = vec![0x00, 0x13, 0x37]; // line noise
//! stream.extend(encode_frame(0x01, &[0x11, 0x22]).unwrap());
//!
//! let frames = decoder.push(&stream);
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].payload(), &[0x11, 0x22]);
//! ```

use bytes::{Buf, Bytes, BytesMut};

use super::checksum::checksum;
use super::wire_format::{expected_payload_len, FOOTER_BYTE, HEADER_BYTE, TRAILER_SIZE};
use super::Frame;

/// Default buffer capacity; a few maximum-size frames.
const DEFAULT_CAPACITY: usize = 1024;

/// State machine for frame parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Scanning for the header byte.
    SeekHeader,
    /// Header seen, command byte next.
    ReadCommand,
    /// Command read, length byte next.
    ReadLength { command: u8 },
    /// Waiting until `length` payload bytes plus checksum and footer are buffered.
    AwaitPayload { command: u8, length: u8 },
}

/// Counters describing what the decoder has seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames that validated and were emitted.
    pub frames: u64,
    /// Bytes dropped while looking for a header.
    pub skipped_bytes: u64,
    /// Frames discarded for a checksum mismatch.
    pub checksum_errors: u64,
    /// Frames discarded for a wrong footer byte.
    pub footer_errors: u64,
    /// Frames discarded because the command requires a different payload length.
    pub length_errors: u64,
    /// Half-read headers abandoned after a read timeout.
    pub header_timeouts: u64,
}

impl DecoderStats {
    /// Total frames thrown away after their payload was consumed.
    pub fn discarded(&self) -> u64 {
        self.checksum_errors + self.footer_errors + self.length_errors
    }
}

/// Decoder that turns an arbitrary byte stream into validated frames.
///
/// Never assumes the stream starts on a frame boundary. Corrupt frames are
/// dropped silently (and counted in [`DecoderStats`]); they never surface as
/// errors.
pub struct FrameDecoder {
    /// Bytes received but not yet consumed by the state machine.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    stats: DecoderStats,
}

impl FrameDecoder {
    /// Create a new decoder with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new decoder with a custom initial buffer capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            state: State::SeekHeader,
            stats: DecoderStats::default(),
        }
    }

    /// Push data into the decoder and extract all complete frames.
    ///
    /// Frames are returned in the order they appeared on the wire. Partial
    /// data is kept for the next push.
    pub fn push(&mut self, data: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one() {
            frames.push(frame);
        }
        frames
    }

    /// Tell the decoder that the source produced nothing within the read timeout.
    ///
    /// A header whose command or length byte never arrived is treated as
    /// noise and abandoned. A frame already waiting for its payload keeps
    /// waiting.
    pub fn on_read_timeout(&mut self) {
        if matches!(self.state, State::ReadCommand | State::ReadLength { .. }) {
            tracing::debug!("Read timeout inside frame header, resuming header search");
            self.stats.header_timeouts += 1;
            self.state = State::SeekHeader;
        }
    }

    /// Advance the state machine as far as the buffered bytes allow.
    ///
    /// Returns `Some(frame)` when a frame validated, `None` when more data is needed.
    fn try_extract_one(&mut self) -> Option<Frame> {
        loop {
            match self.state {
                State::SeekHeader => match self.buffer.iter().position(|&b| b == HEADER_BYTE) {
                    Some(pos) => {
                        self.stats.skipped_bytes += pos as u64;
                        self.buffer.advance(pos + 1);
                        self.state = State::ReadCommand;
                    }
                    None => {
                        self.stats.skipped_bytes += self.buffer.len() as u64;
                        self.buffer.clear();
                        return None;
                    }
                },

                State::ReadCommand => {
                    if self.buffer.is_empty() {
                        return None;
                    }
                    let command = self.buffer.get_u8();
                    self.state = State::ReadLength { command };
                }

                State::ReadLength { command } => {
                    if self.buffer.is_empty() {
                        return None;
                    }
                    let length = self.buffer.get_u8();
                    self.state = State::AwaitPayload { command, length };
                }

                State::AwaitPayload { command, length } => {
                    if self.buffer.len() < length as usize + TRAILER_SIZE {
                        return None;
                    }

                    let payload = self.buffer.split_to(length as usize).freeze();
                    let received_checksum = self.buffer.get_u8();
                    let footer = self.buffer.get_u8();
                    self.state = State::SeekHeader;

                    if let Some(frame) =
                        self.validate(command, length, payload, received_checksum, footer)
                    {
                        return Some(frame);
                    }
                }
            }
        }
    }

    /// Check footer, checksum and command-specific length.
    fn validate(
        &mut self,
        command: u8,
        length: u8,
        payload: Bytes,
        received_checksum: u8,
        footer: u8,
    ) -> Option<Frame> {
        if footer != FOOTER_BYTE {
            tracing::debug!(command, footer, "Discarding frame: bad footer");
            self.stats.footer_errors += 1;
            return None;
        }

        let computed = checksum(HEADER_BYTE, command, length, &payload);
        if computed != received_checksum {
            tracing::debug!(
                command,
                computed,
                received = received_checksum,
                "Discarding frame: checksum mismatch"
            );
            self.stats.checksum_errors += 1;
            return None;
        }

        if let Some(expected) = expected_payload_len(command) {
            if payload.len() != expected {
                tracing::debug!(
                    command,
                    expected,
                    actual = payload.len(),
                    "Discarding frame: wrong payload length for command"
                );
                self.stats.length_errors += 1;
                return None;
            }
        }

        tracing::trace!(command, length, "Frame decoded");
        self.stats.frames += 1;
        Some(Frame::new(command, payload))
    }

    /// Counters accumulated since creation.
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if a frame header has been seen and the frame is not finished yet.
    pub fn is_mid_frame(&self) -> bool {
        self.state != State::SeekHeader
    }

    /// Clear the buffer and reset state. Counters are kept.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::SeekHeader;
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::SeekHeader => "SeekHeader",
            State::ReadCommand => "ReadCommand",
            State::ReadLength { .. } => "ReadLength",
            State::AwaitPayload { .. } => "AwaitPayload",
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
