//! Typed payload structures.
//!
//! Handlers declare the payload shape they expect as a plain serde type. The
//! dispatch layer works with type-erased [`PayloadStructure`] objects so one
//! table can hold actions with different payload types; [`Structured`] is the
//! generic adapter that carries any serde type across that boundary.
//!
//! A [`StructureFactory`] produces a fresh, zero-valued instance for each
//! dispatch. Instances are never shared across concurrent dispatches; this is
//! the concurrency-safety boundary for payload state.

use std::any::Any;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::PayloadCodec;
use crate::error::CodecError;

/// Object-safe surface of a typed payload.
pub trait PayloadStructure: Send + Sync {
    /// Fill this structure by decoding wire bytes with the given codec.
    fn decode_from(&mut self, codec: &dyn PayloadCodec, bytes: &[u8]) -> Result<(), CodecError>;

    /// Encode this structure into wire bytes with the given codec.
    fn encode_with(&self, codec: &dyn PayloadCodec) -> Result<Vec<u8>, CodecError>;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;
}

/// Generic adapter carrying any serde payload type as a [`PayloadStructure`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Structured<T>(pub T);

impl<T> PayloadStructure for Structured<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn decode_from(&mut self, codec: &dyn PayloadCodec, bytes: &[u8]) -> Result<(), CodecError> {
        let value = codec.decode(bytes)?;
        self.0 = serde_json::from_value(value).map_err(|e| CodecError::decode(codec.format(), e))?;
        Ok(())
    }

    fn encode_with(&self, codec: &dyn PayloadCodec) -> Result<Vec<u8>, CodecError> {
        let value =
            serde_json::to_value(&self.0).map_err(|e| CodecError::encode(codec.format(), e))?;
        codec.encode(&value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Constructor producing a fresh payload structure per dispatch.
pub type StructureFactory = Arc<dyn Fn() -> Box<dyn PayloadStructure> + Send + Sync>;

/// Build a [`StructureFactory`] for a payload type.
///
/// Each invocation yields a fresh `T::default()` wrapped in [`Structured`].
#[must_use]
pub fn structure_of<T>() -> StructureFactory
where
    T: Serialize + DeserializeOwned + Default + Send + Sync + 'static,
{
    Arc::new(|| Box::new(Structured(T::default())))
}

/// Borrow the typed payload out of a type-erased structure, if it is a
/// [`Structured<T>`] of the expected type.
#[must_use]
pub fn downcast_payload<T: 'static>(structure: &dyn PayloadStructure) -> Option<&T> {
    structure
        .as_any()
        .downcast_ref::<Structured<T>>()
        .map(|s| &s.0)
}
