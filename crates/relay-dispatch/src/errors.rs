//! Dispatch error taxonomy and status codes.

use relay_core::{Action, ActionId};

// ── Status code constants ───────────────────────────────────────────

/// Unknown action or channel — client-correctable.
pub const NOT_FOUND: &str = "NOT_FOUND";
/// Payload failed to decode against the declared structure — client-correctable.
pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
/// Handler execution or response encoding failed — opaque to the caller.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Error returned to the inbound caller by the dispatch service.
///
/// Never retried at this layer; the taxonomy tells the caller whether the
/// failure is theirs to correct.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No handler is registered for the action on the channel.
    #[error("no handler for action {action_id} on channel '{channel}'")]
    NotFound {
        /// The unresolved action ID.
        action_id: ActionId,
        /// The channel that was searched.
        channel: String,
    },

    /// The payload could not be decoded into the action's declared structure.
    #[error("invalid payload for action {action}: {message}")]
    InvalidPayload {
        /// The resolved action.
        action: Action,
        /// Underlying decode message.
        message: String,
    },

    /// The handler failed or the reply could not be encoded.
    #[error("{message}")]
    Internal {
        /// Original failure message.
        message: String,
    },
}

impl DispatchError {
    /// Build a not-found error.
    #[must_use]
    pub fn not_found(action_id: ActionId, channel: impl Into<String>) -> Self {
        Self::NotFound {
            action_id,
            channel: channel.into(),
        }
    }

    /// Build an invalid-payload error.
    pub fn invalid_payload(action: Action, message: impl std::fmt::Display) -> Self {
        Self::InvalidPayload {
            action,
            message: message.to_string(),
        }
    }

    /// Build an internal error carrying the original message.
    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }

    /// Machine-readable status code for this variant.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => NOT_FOUND,
            Self::InvalidPayload { .. } => INVALID_ARGUMENT,
            Self::Internal { .. } => INTERNAL_ERROR,
        }
    }
}
