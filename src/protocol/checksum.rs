//! Running XOR checksum shared by the encoder and the decoder.

/// Compute the frame checksum.
///
/// Starts from `header`, then folds in `command`, `length` and every payload
/// byte in order.
///
/// # Example
///
/// ```
/// use sensorlink::protocol::{checksum, HEADER_BYTE};
///
/// let sum = checksum(HEADER_BYTE, 0x01, 2, &[0x11, 0x22]);
/// assert_eq!(sum, 0xA5 ^ 0x01 ^ 0x02 ^ 0x11 ^ 0x22);
/// ```
#[inline]
pub fn checksum(header: u8, command: u8, length: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(header ^ command ^ length, |acc, &byte| acc ^ byte)
}
