//! NFC UID payloads.

use std::fmt;

use serde::{Serialize, Serializer};

/// Formats raw UID bytes for display.
pub struct UidCodec;

impl UidCodec {
    /// Render bytes as space-separated uppercase hex pairs.
    ///
    /// An empty slice renders as an empty string.
    pub fn format(bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// UID read from an NFC tag.
///
/// Serializes as its hex string, e.g. `"04 A2 3B 91"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NfcUid(Vec<u8>);

impl NfcUid {
    /// Wrap raw UID bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw UID bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of UID bytes (0 for an empty tag report).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the report carried no UID bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Space-separated uppercase hex form.
    pub fn to_hex(&self) -> String {
        UidCodec::format(&self.0)
    }
}

impl fmt::Display for NfcUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for NfcUid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
