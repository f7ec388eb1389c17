//! Handler trait and the per-dispatch request/reply types.

use std::sync::Arc;

use async_trait::async_trait;

use relay_codec::{PayloadStructure, Structured, downcast_payload};
use relay_core::{Action, BoundIdentitySet, CallContext, ConnDescriptor};
use serde::Serialize;

/// One dispatch, as seen by a handler.
///
/// Created fresh per call and discarded after the handler returns. The
/// decoded payload is produced by this dispatch's own structure-factory
/// invocation, so payload state is never shared with concurrent dispatches.
#[derive(Clone)]
pub struct HandlerRequest {
    /// The resolved action.
    pub action: Action,
    /// Origin gateway instance the call arrived through.
    pub gateway: String,
    /// The originating connection on that gateway.
    pub conn: ConnDescriptor,
    /// Identity bindings decoded for the connection, if any.
    pub identities: BoundIdentitySet,
    /// Caller identity, when the gateway forwarded one.
    pub caller_id: Option<String>,
    /// Target metadata, when the gateway forwarded some.
    pub target: Option<String>,
    /// Call-scoped provenance.
    pub context: CallContext,
    pub(crate) payload: Option<Arc<dyn PayloadStructure>>,
}

impl HandlerRequest {
    /// The decoded payload, if the action declares one.
    #[must_use]
    pub fn payload(&self) -> Option<&dyn PayloadStructure> {
        self.payload.as_deref()
    }

    /// The decoded payload downcast to its concrete type.
    #[must_use]
    pub fn payload_as<T: 'static>(&self) -> Option<&T> {
        downcast_payload(self.payload.as_deref()?)
    }
}

impl std::fmt::Debug for HandlerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRequest")
            .field("action", &self.action)
            .field("gateway", &self.gateway)
            .field("conn", &self.conn)
            .field("has_payload", &self.payload.is_some())
            .finish_non_exhaustive()
    }
}

/// A handler's reply: the response action plus an optional typed payload.
pub struct ActionReply {
    action: Action,
    payload: Option<Box<dyn PayloadStructure>>,
}

impl ActionReply {
    /// Reply with no payload.
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            action,
            payload: None,
        }
    }

    /// Reply carrying a typed payload.
    #[must_use]
    pub fn with_payload<T>(action: Action, payload: T) -> Self
    where
        T: Serialize + serde::de::DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            action,
            payload: Some(Box::new(Structured(payload))),
        }
    }

    /// The response action.
    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Split into action and payload for encoding.
    #[must_use]
    pub fn into_parts(self) -> (Action, Option<Box<dyn PayloadStructure>>) {
        (self.action, self.payload)
    }
}

/// A registered action handler.
///
/// Side effects (messages sent back out through a gateway client) are the
/// handler's responsibility; the dispatch service only transcodes and routes.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Execute the action. Any error is surfaced to the inbound caller as an
    /// internal failure carrying this error's message.
    async fn handle(&self, request: HandlerRequest) -> anyhow::Result<ActionReply>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Ping {
        seq: u32,
    }

    fn make_request(payload: Option<Arc<dyn PayloadStructure>>) -> HandlerRequest {
        HandlerRequest {
            action: Action::new(1, "ping"),
            gateway: "gw-1".into(),
            conn: ConnDescriptor::new(42),
            identities: BoundIdentitySet::new(),
            caller_id: None,
            target: None,
            context: CallContext::new(),
            payload,
        }
    }

    #[test]
    fn payload_downcast() {
        let request = make_request(Some(Arc::new(Structured(Ping { seq: 9 }))));
        assert_eq!(request.payload_as::<Ping>().unwrap().seq, 9);
        assert!(request.payload_as::<String>().is_none());
    }

    #[test]
    fn absent_payload() {
        let request = make_request(None);
        assert!(request.payload().is_none());
        assert!(request.payload_as::<Ping>().is_none());
    }

    #[test]
    fn reply_parts() {
        let reply = ActionReply::with_payload(Action::new(2, "pong"), Ping { seq: 1 });
        assert_eq!(reply.action().id.value(), 2);
        let (action, payload) = reply.into_parts();
        assert_eq!(action.name, "pong");
        assert!(payload.is_some());

        let (_, payload) = ActionReply::new(Action::new(3, "empty")).into_parts();
        assert!(payload.is_none());
    }

    #[test]
    fn request_debug_hides_payload_contents() {
        let request = make_request(Some(Arc::new(Structured(Ping { seq: 9 }))));
        let rendered = format!("{request:?}");
        assert!(rendered.contains("has_payload: true"));
    }
}
