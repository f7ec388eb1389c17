//! Wire-format selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The payload wire format of an inbound or outbound message.
///
/// TCP clients typically speak the binary format and browser clients JSON,
/// but the mapping is the gateway's business; this layer only transcodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Compact self-describing binary encoding (MessagePack).
    #[default]
    Binary,
    /// JSON text encoding.
    Json,
}

impl WireFormat {
    /// Resolve a format from its wire name.
    ///
    /// Unrecognized names resolve to [`WireFormat::Binary`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            _ => Self::Binary,
        }
    }

    /// The format's canonical wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
