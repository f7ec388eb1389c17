//! Per-format payload codecs.
//!
//! A codec maps raw wire bytes to and from a neutral [`serde_json::Value`].
//! The typed layer ([`crate::structure`]) converts between that neutral value
//! and the concrete payload structure a handler expects, so every structure
//! automatically works in both wire formats.

use serde_json::Value;

use crate::error::CodecError;
use crate::format::WireFormat;

/// Bytes ⇄ neutral value encoding for one wire format.
///
/// Codecs are stateless and safe for concurrent reuse after construction.
pub trait PayloadCodec: Send + Sync {
    /// The wire format this codec implements.
    fn format(&self) -> WireFormat;

    /// Encode a neutral value into wire bytes.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    /// Decode wire bytes into a neutral value.
    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}

/// JSON text codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create the JSON codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PayloadCodec for JsonCodec {
    fn format(&self) -> WireFormat {
        WireFormat::Json
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::encode(WireFormat::Json, e))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::decode(WireFormat::Json, e))
    }
}

/// Compact binary codec (MessagePack).
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryCodec;

impl BinaryCodec {
    /// Create the binary codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PayloadCodec for BinaryCodec {
    fn format(&self) -> WireFormat {
        WireFormat::Binary
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        rmp_serde::to_vec_named(value).map_err(|e| CodecError::encode(WireFormat::Binary, e))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        rmp_serde::from_slice(bytes).map_err(|e| CodecError::decode(WireFormat::Binary, e))
    }
}
