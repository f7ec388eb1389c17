//! Codec error type.

use crate::format::WireFormat;

/// Error produced while encoding or decoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Payload bytes could not be decoded in the given format.
    #[error("decode ({format}) failed: {message}")]
    Decode {
        /// Wire format that was attempted.
        format: WireFormat,
        /// Underlying decoder message.
        message: String,
    },

    /// A value could not be encoded in the given format.
    #[error("encode ({format}) failed: {message}")]
    Encode {
        /// Wire format that was attempted.
        format: WireFormat,
        /// Underlying encoder message.
        message: String,
    },
}

impl CodecError {
    /// Build a decode error from any displayable source.
    pub fn decode(format: WireFormat, source: impl std::fmt::Display) -> Self {
        Self::Decode {
            format,
            message: source.to_string(),
        }
    }

    /// Build an encode error from any displayable source.
    pub fn encode(format: WireFormat, source: impl std::fmt::Display) -> Self {
        Self::Encode {
            format,
            message: source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_message_names_format() {
        let err = CodecError::decode(WireFormat::Json, "unexpected end of input");
        assert!(err.to_string().contains("json"));
        assert!(err.to_string().contains("unexpected end of input"));
    }

    #[test]
    fn encode_message_names_format() {
        let err = CodecError::encode(WireFormat::Binary, "key must be a string");
        assert!(err.to_string().starts_with("encode (binary)"));
    }
}
