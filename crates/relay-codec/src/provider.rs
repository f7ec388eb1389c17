//! Lazy per-format codec provider.

use std::sync::OnceLock;

use crate::codec::{BinaryCodec, JsonCodec, PayloadCodec};
use crate::format::WireFormat;

/// Builds and caches exactly one codec instance per wire format.
///
/// Construction is deferred until a format is first requested; after that the
/// same instance is reused for every call. Codecs are stateless, so sharing
/// one instance across arbitrarily many concurrent dispatches is safe.
#[derive(Debug, Default)]
pub struct CodecProvider {
    json: OnceLock<JsonCodec>,
    binary: OnceLock<BinaryCodec>,
}

impl CodecProvider {
    /// Create an empty provider; no codecs are built yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The codec for a wire format, building it on first request.
    pub fn get(&self, format: WireFormat) -> &dyn PayloadCodec {
        match format {
            WireFormat::Json => self.json.get_or_init(JsonCodec::new),
            WireFormat::Binary => self.binary.get_or_init(BinaryCodec::new),
        }
    }

    /// The codec for a wire-format name; unrecognized names resolve to binary.
    pub fn get_named(&self, name: &str) -> &dyn PayloadCodec {
        self.get(WireFormat::from_name(name))
    }
}
