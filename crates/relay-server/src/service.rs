//! The inbound RPC surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use relay_codec::WireFormat;
use relay_core::{ActionId, BoundIdentitySet, CallContext, ConnDescriptor};
use relay_dispatch::{DispatchError, Dispatcher, InboundCall};

/// One inbound `Handle` call as it crosses the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleRequest {
    /// Business channel naming the action table.
    pub channel: String,
    /// Requested action ID.
    pub action_id: u32,
    /// Origin gateway instance.
    pub gateway: String,
    /// Originating connection descriptor.
    pub conn: i64,
    /// Identity bindings decoded for the connection.
    #[serde(default)]
    pub identities: BoundIdentitySet,
    /// Caller identity, if forwarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<String>,
    /// Target metadata, if forwarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Wire-format name; unrecognized names resolve to binary.
    pub format: String,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// Request-correlation ID, if the caller carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// The `Handle` reply sent back to the gateway.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleResponse {
    /// Response action ID.
    pub action_id: u32,
    /// Response action name.
    pub action_name: String,
    /// Reply payload in the request's wire format.
    pub payload: Vec<u8>,
}

/// The one remote method a handler process exposes.
///
/// Thin translation layer: wire request → [`InboundCall`] → dispatcher →
/// wire response, with request/response logging. Refuses traffic until the
/// server has finished registering its actions.
#[derive(Clone)]
pub struct HandlerService {
    dispatcher: Arc<Dispatcher>,
    ready: Arc<AtomicBool>,
}

impl HandlerService {
    /// Create the service over a dispatcher and a readiness flag.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>, ready: Arc<AtomicBool>) -> Self {
        Self { dispatcher, ready }
    }

    /// Handle one inbound call.
    pub async fn handle(&self, request: HandleRequest) -> Result<HandleResponse, DispatchError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(DispatchError::internal("handler is not serving yet"));
        }

        debug!(
            channel = request.channel,
            action_id = request.action_id,
            gateway = request.gateway,
            conn = request.conn,
            format = request.format,
            payload_len = request.payload.len(),
            "handle request"
        );

        let call = InboundCall {
            channel: request.channel,
            action_id: ActionId::new(request.action_id),
            format: WireFormat::from_name(&request.format),
            payload: request.payload,
            gateway: request.gateway,
            conn: ConnDescriptor::new(request.conn),
            identities: request.identities,
            caller_id: request.caller_id,
            target: request.target,
            context: match request.correlation_id {
                Some(id) => CallContext::with_correlation(id),
                None => CallContext::new(),
            },
        };

        let reply = self.dispatcher.dispatch(call).await.inspect_err(|err| {
            error!(code = err.code(), error = %err, "handle failed");
        })?;

        debug!(
            action_id = reply.action.id.value(),
            action_name = reply.action.name,
            payload_len = reply.payload.len(),
            "handle response"
        );

        Ok(HandleResponse {
            action_id: reply.action.id.value(),
            action_name: reply.action.name,
            payload: reply.payload,
        })
    }
}
