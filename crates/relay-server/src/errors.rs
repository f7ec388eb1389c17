//! Server startup errors.

use relay_registry::RegistryError;

/// Error that blocks the handler from starting to serve.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid or missing startup configuration.
    #[error("configuration error: {message}")]
    Config {
        /// What is wrong.
        message: String,
    },

    /// Watch subscription or action registration failed.
    ///
    /// The handler must not accept dispatches while unregistered — downstream
    /// routers would never learn to send it traffic.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ServerError {
    /// Build a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_message() {
        let err = ServerError::config("handler rpc address required");
        assert!(err.to_string().contains("handler rpc address required"));
    }

    #[test]
    fn registry_error_converts() {
        let err: ServerError = RegistryError::subscribe("gateways/tcp/", "down").into();
        assert!(matches!(err, ServerError::Registry(_)));
    }
}
