//! Codec module - typed views of validated payloads.
//!
//! - [`UidCodec`] - NFC UID bytes to the space-separated hex form shown to users
//! - [`ThermalCodec`] - 128-byte thermal report to an 8×8 grid of °C readings
//!
//! # Design
//!
//! Codecs are marker structs with static methods rather than trait objects.
//! They only ever see payloads the decoder has already validated.
//!
//! # Example
//!
//! ```
//! use sensorlink::codec::{ThermalCodec, UidCodec};
//!
//! assert_eq!(UidCodec::format(&[0x04, 0xA2, 0x3B]), "04 A2 3B");
//!
//! let mut payload = [0u8; 128];
//! payload[0] = 0x09;
//! payload[1] = 0xC4; // 2500 centi-degrees
//! let frame = ThermalCodec::decode(&payload).unwrap();
//! assert_eq!(frame.get(0, 0), 25.0);
//! ```

mod thermal;
mod uid;

pub use thermal::{ThermalCodec, ThermalFrame};
pub use uid::{NfcUid, UidCodec};
