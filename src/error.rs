//! Error types for sensorlink.

use thiserror::Error;

/// Main error type for all link operations.
///
/// Corrupt or misaligned frames never show up here: the decoder discards them
/// and resynchronizes on its own. Only endpoint failures and decoder invariant
/// violations reach the caller.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The serial endpoint could not be opened.
    #[error("Endpoint {endpoint} unavailable: {source}")]
    EndpointUnavailable {
        endpoint: String,
        #[source]
        source: serialport::Error,
    },

    /// Writing an outbound frame to the endpoint failed.
    #[error("Write failure: {0}")]
    WriteFailure(#[source] std::io::Error),

    /// I/O error on the read side of the link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload does not fit the one-byte length field.
    #[error("Payload of {len} bytes exceeds maximum 255")]
    PayloadTooLarge { len: usize },

    /// A validated thermal frame did not carry exactly 128 bytes.
    #[error("Malformed thermal payload: expected 128 bytes, got {len}")]
    MalformedThermalPayload { len: usize },

    /// The writer task has stopped; the link is closed.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type alias using LinkError.
pub type Result<T> = std::result::Result<T, LinkError>;
