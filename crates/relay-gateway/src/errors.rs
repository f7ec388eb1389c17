//! Gateway operation errors.

use relay_codec::CodecError;
use relay_core::SocketRole;

/// A remote call to one gateway host failed.
///
/// Surfaced as-is to the operation caller; never retried at this layer.
#[derive(Debug, thiserror::Error)]
#[error("call '{method}' to gateway {host} failed: {message}")]
pub struct TransportError {
    /// Host the call targeted.
    pub host: String,
    /// Remote method name.
    pub method: String,
    /// Underlying transport message.
    pub message: String,
}

impl TransportError {
    /// Build a transport error.
    pub fn new(
        host: impl Into<String>,
        method: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self {
            host: host.into(),
            method: method.into(),
            message: message.to_string(),
        }
    }
}

/// Error returned by a [`GatewayClient`](crate::GatewayClient) operation.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The remote call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An any-host delivery found no gateways to try.
    #[error("no known {role} gateway hosts")]
    NoHosts {
        /// The role whose host set was empty.
        role: SocketRole,
    },

    /// The message payload could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl GatewayError {
    /// Build a no-hosts error for a role.
    #[must_use]
    pub fn no_hosts(role: &SocketRole) -> Self {
        Self::NoHosts { role: role.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_names_host_and_method() {
        let err = TransportError::new("10.0.0.2:9000", "send_message", "connection reset");
        assert!(err.to_string().contains("10.0.0.2:9000"));
        assert!(err.to_string().contains("send_message"));
    }

    #[test]
    fn no_hosts_names_role() {
        let err = GatewayError::no_hosts(&SocketRole::Wss);
        assert_eq!(err.to_string(), "no known wss gateway hosts");
    }
}
