//! # sensorlink
//!
//! Host-side link to a sensor board carrying an NFC reader and an 8×8
//! thermal array.
//!
//! The board and the host exchange small binary frames over a serial line.
//! This crate finds those frames in an unreliable byte stream, turns them
//! into typed events and writes request frames back.
//!
//! ## Architecture
//!
//! - **Protocol**: wire constants, XOR checksum, frame encoding and the
//!   resynchronizing decoder
//! - **Codec / Event**: payload interpretation into [`DomainEvent`]s
//! - **Session**: one worker task reading and decoding, one writer task for
//!   outbound frames, events delivered in wire order
//! - **Transport**: serial port halves usable as tokio `AsyncRead`/`AsyncWrite`
//!
//! ## Example
//!
//! ```ignore
//! use sensorlink::{DomainEvent, LinkSession};
//!
//! #[tokio::main]
//! async fn main() -> sensorlink::Result<()> {
//!     let mut session = LinkSession::open("/dev/ttyUSB0").await?;
//!
//!     while let Some(event) = session.next_event().await {
//!         match event {
//!             DomainEvent::NfcUid(uid) => println!("tag {uid}"),
//!             DomainEvent::ThermalFrame(frame) => println!("max {:.2}", frame.max()),
//!             _ => {}
//!         }
//!     }
//!
//!     session.close().await
//! }
//! ```

pub mod codec;
pub mod error;
pub mod event;
pub mod protocol;
pub mod transport;

mod session;
mod writer;

pub use error::{LinkError, Result};
pub use event::DomainEvent;
pub use session::{
    LinkSession, LinkSessionBuilder, SessionConfig, StopHandle, DEFAULT_EVENT_CAPACITY,
    DEFAULT_READ_BUFFER_SIZE, DEFAULT_READ_TIMEOUT,
};
pub use writer::DEFAULT_CHANNEL_CAPACITY;
