//! The RPC-facing dispatch service.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, error};

use relay_codec::{CodecProvider, PayloadStructure, WireFormat};
use relay_core::{ActionId, BoundIdentitySet, CallContext, ConnDescriptor};

use crate::errors::DispatchError;
use crate::handler::HandlerRequest;
use crate::table::TableProvider;

/// One inbound remote call, as delivered by the transport layer.
#[derive(Clone, Debug)]
pub struct InboundCall {
    /// Business channel naming the action table.
    pub channel: String,
    /// Requested action.
    pub action_id: ActionId,
    /// Wire format of `payload` — and of the encoded reply.
    pub format: WireFormat,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// Origin gateway instance.
    pub gateway: String,
    /// Originating connection descriptor.
    pub conn: ConnDescriptor,
    /// Identity bindings decoded for the connection.
    pub identities: BoundIdentitySet,
    /// Caller identity, if forwarded.
    pub caller_id: Option<String>,
    /// Target metadata, if forwarded.
    pub target: Option<String>,
    /// Call-scoped provenance.
    pub context: CallContext,
}

/// The encoded reply returned to the transport layer.
#[derive(Debug)]
pub struct DispatchReply {
    /// Response action (ID and name travel back to the client).
    pub action: relay_core::Action,
    /// Reply payload in the caller's wire format; empty when the handler
    /// returned none.
    pub payload: Vec<u8>,
}

/// Routes inbound calls to registered handlers with format-aware transcoding.
///
/// Fully synchronous request/response: no retries, no timeouts — those belong
/// to the transport capability underneath.
pub struct Dispatcher {
    tables: Arc<TableProvider>,
    codecs: Arc<CodecProvider>,
}

impl Dispatcher {
    /// Create a dispatcher over the given tables and codecs.
    #[must_use]
    pub fn new(tables: Arc<TableProvider>, codecs: Arc<CodecProvider>) -> Self {
        Self { tables, codecs }
    }

    /// The table provider this dispatcher routes through.
    #[must_use]
    pub fn tables(&self) -> &Arc<TableProvider> {
        &self.tables
    }

    /// Dispatch one inbound call.
    pub async fn dispatch(&self, call: InboundCall) -> Result<DispatchReply, DispatchError> {
        let channel = call.channel.clone();
        counter!("relay_dispatch_total", "channel" => channel.clone()).increment(1);
        let start = Instant::now();

        let result = self.dispatch_inner(call).await;

        if let Err(err) = &result {
            counter!(
                "relay_dispatch_errors_total",
                "channel" => channel.clone(),
                "code" => err.code()
            )
            .increment(1);
        }
        histogram!("relay_dispatch_duration_seconds", "channel" => channel)
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn dispatch_inner(&self, call: InboundCall) -> Result<DispatchReply, DispatchError> {
        debug!(
            channel = call.channel,
            action_id = %call.action_id,
            gateway = call.gateway,
            conn = %call.conn,
            format = %call.format,
            payload_len = call.payload.len(),
            "dispatching inbound call"
        );

        // Dispatch may be the first access to a channel.
        let table = self.tables.table(&call.channel);
        let Some(entry) = table.get(call.action_id) else {
            error!(channel = call.channel, action_id = %call.action_id, "action not found");
            return Err(DispatchError::not_found(call.action_id, call.channel));
        };

        let codec = self.codecs.get(call.format);

        let payload: Option<Arc<dyn PayloadStructure>> = match &entry.structure {
            Some(factory) => {
                let mut structure = factory();
                structure
                    .decode_from(codec, &call.payload)
                    .map_err(|e| DispatchError::invalid_payload(entry.action.clone(), e))?;
                Some(Arc::from(structure))
            }
            None => None,
        };

        let request = HandlerRequest {
            action: entry.action.clone(),
            gateway: call.gateway,
            conn: call.conn,
            identities: call.identities,
            caller_id: call.caller_id,
            target: call.target,
            context: call.context,
            payload,
        };

        let reply = entry.handler.handle(request).await.map_err(|err| {
            error!(action = %entry.action, error = %err, "handler failed");
            DispatchError::internal(err)
        })?;

        let (action, reply_payload) = reply.into_parts();
        let payload = match reply_payload {
            Some(structure) => structure
                .encode_with(codec)
                .map_err(DispatchError::internal)?,
            None => Vec::new(),
        };

        debug!(action = %action, payload_len = payload.len(), "dispatch complete");
        Ok(DispatchReply { action, payload })
    }
}
