//! Serial port endpoint.
//!
//! Opens a device with `serialport` and splits it into an async read half and
//! an async write half backed by two handles to the same port.
//!
//! # Example
//!
//! ```ignore
//! use sensorlink::transport::{open_serial, SerialConfig};
//!
//! let (reader, writer) = open_serial("/dev/ttyUSB0", &SerialConfig::default())?;
//! ```

use std::time::Duration;

use serialport::SerialPort;

use super::blocking::{BlockingReader, BlockingWriter, DEFAULT_READ_CHUNK};
use crate::error::{LinkError, Result};

/// Default baud rate of the sensor board.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default driver-level read timeout.
///
/// Bounds how long a closed session keeps the port open; it is not the
/// protocol's read timeout.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Read half of an open serial port.
pub type SerialReader = BlockingReader<Box<dyn SerialPort>>;

/// Write half of an open serial port.
pub type SerialWriter = BlockingWriter<Box<dyn SerialPort>>;

/// Serial port settings.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Line speed.
    pub baud_rate: u32,
    /// Timeout of each blocking read on the port.
    pub poll_timeout: Duration,
    /// Maximum bytes pulled from the driver per read.
    pub read_chunk_size: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            read_chunk_size: DEFAULT_READ_CHUNK,
        }
    }
}

/// Open a serial device and split it into read and write halves.
///
/// Fails once with [`LinkError::EndpointUnavailable`]; there is no retry.
pub fn open_serial(path: &str, config: &SerialConfig) -> Result<(SerialReader, SerialWriter)> {
    let unavailable = |source| LinkError::EndpointUnavailable {
        endpoint: path.to_string(),
        source,
    };

    let port = serialport::new(path, config.baud_rate)
        .timeout(config.poll_timeout)
        .open()
        .map_err(unavailable)?;
    let write_port = port.try_clone().map_err(unavailable)?;

    tracing::info!(path, baud = config.baud_rate, "Opened serial port");

    Ok((
        BlockingReader::with_chunk_size(port, config.read_chunk_size),
        BlockingWriter::new(write_port),
    ))
}

/// Names of the serial devices present on this machine.
///
/// Returns an empty list when enumeration is not possible.
pub fn available_ports() -> Vec<String> {
    serialport::available_ports()
        .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
        .unwrap_or_default()
}
