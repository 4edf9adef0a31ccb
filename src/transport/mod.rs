//! Transport module - byte endpoints for a link session.
//!
//! A session only needs an [`AsyncRead`](tokio::io::AsyncRead) half and an
//! [`AsyncWrite`](tokio::io::AsyncWrite) half. This module provides them for
//! serial devices:
//! - blocking-handle adapters driven through `spawn_blocking`
//! - serial port opening and device listing

mod blocking;
mod serial;

pub use blocking::{BlockingReader, BlockingWriter, DEFAULT_READ_CHUNK};
pub use serial::{
    available_ports, open_serial, SerialConfig, SerialReader, SerialWriter, DEFAULT_BAUD_RATE,
    DEFAULT_POLL_TIMEOUT,
};
