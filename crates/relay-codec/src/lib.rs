//! # relay-codec
//!
//! Wire-format payload codecs and typed payload structures.
//!
//! Gateways deliver opaque payload bytes in one of two wire formats: a
//! compact binary encoding (MessagePack) or JSON. This crate provides:
//!
//! - [`WireFormat`]: the format selector (unknown names resolve to binary)
//! - [`PayloadCodec`]: bytes ⇄ neutral value encoding for one format
//! - [`CodecProvider`]: lazily builds exactly one codec per format
//! - [`PayloadStructure`] / [`Structured`]: the typed payload surface —
//!   a fresh structure instance is produced per dispatch, so payload state is
//!   never shared across concurrent calls

#![deny(unsafe_code)]

pub mod codec;
pub mod error;
pub mod format;
pub mod provider;
pub mod structure;

pub use codec::{BinaryCodec, JsonCodec, PayloadCodec};
pub use error::CodecError;
pub use format::WireFormat;
pub use provider::CodecProvider;
pub use structure::{PayloadStructure, StructureFactory, Structured, downcast_payload, structure_of};
