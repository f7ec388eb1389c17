//! Registry error type.

/// Error surfaced by a [`Registry`](crate::Registry) operation.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A register/unregister call was rejected or the registry is unreachable.
    #[error("registry operation '{operation}' on '{key}' failed: {message}")]
    Operation {
        /// Which operation failed (`register`, `unregister`).
        operation: &'static str,
        /// The key the operation targeted.
        key: String,
        /// Underlying registry message.
        message: String,
    },

    /// A prefix watch subscription could not be established.
    ///
    /// This is a startup-blocking condition for membership watching.
    #[error("watch subscription on prefix '{prefix}' failed: {message}")]
    Subscribe {
        /// The watched key prefix.
        prefix: String,
        /// Underlying registry message.
        message: String,
    },
}

impl RegistryError {
    /// Build an operation error.
    pub fn operation(
        operation: &'static str,
        key: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Operation {
            operation,
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Build a subscription error.
    pub fn subscribe(prefix: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Subscribe {
            prefix: prefix.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_message_carries_key() {
        let err = RegistryError::operation("register", "a/b/c", "lease expired");
        assert!(err.to_string().contains("a/b/c"));
        assert!(err.to_string().contains("lease expired"));
    }

    #[test]
    fn subscribe_message_carries_prefix() {
        let err = RegistryError::subscribe("gateways/tcp/", "connection refused");
        assert!(err.to_string().contains("gateways/tcp/"));
    }
}
