//! In-process gateway transport for tests and local development.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use relay_core::{BoundIdentity, CallContext, ConnDescriptor, SocketRole};

use crate::errors::TransportError;
use crate::transport::{
    ChannelResolver, ConnectionInfo, EncodedMessage, GatewayChannel, GroupMember, MessageTarget,
    ServiceSlot,
};

/// One remote call attempt observed by the fake fleet.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// Host the call targeted.
    pub host: String,
    /// Remote method name.
    pub method: String,
    /// Service slot index the channel was resolved for.
    pub slot: u8,
    /// Whether the call succeeded.
    pub ok: bool,
    /// Correlation ID from the call context, if any.
    pub correlation: Option<String>,
}

#[derive(Default)]
struct FleetState {
    calls: Mutex<Vec<RecordedCall>>,
    failing: Mutex<HashSet<String>>,
    // host -> (conn, kind, id) bindings
    bound: Mutex<Vec<(String, i64, String, String)>>,
    // host -> group -> member conns
    groups: Mutex<HashMap<String, HashMap<String, Vec<i64>>>>,
    last_message: Mutex<Option<EncodedMessage>>,
}

/// A whole in-memory gateway fleet behind the [`ChannelResolver`] seam.
///
/// Any host name resolves; hosts marked failing reject every call. All
/// attempts are recorded for assertions on fan-out order and coverage.
#[derive(Clone, Default)]
pub struct MemoryGateway {
    state: Arc<FleetState>,
}

impl MemoryGateway {
    /// Create an empty fleet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolver handle to hand to a client.
    #[must_use]
    pub fn resolver(&self) -> Arc<dyn ChannelResolver> {
        Arc::new(self.clone())
    }

    /// Make every call to `host` fail.
    pub fn fail_host(&self, host: &str) {
        let _ = self.state.failing.lock().insert(host.to_owned());
    }

    /// Let calls to `host` succeed again.
    pub fn restore_host(&self, host: &str) {
        let _ = self.state.failing.lock().remove(host);
    }

    /// All recorded attempts.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().clone()
    }

    /// Hosts of successful calls to `method`, in call order.
    #[must_use]
    pub fn calls_for(&self, method: &str) -> Vec<String> {
        self.state
            .calls
            .lock()
            .iter()
            .filter(|c| c.method == method && c.ok)
            .map(|c| c.host.clone())
            .collect()
    }

    /// Hosts of all attempts at `method` (failed ones included), in order.
    #[must_use]
    pub fn attempts_for(&self, method: &str) -> Vec<String> {
        self.state
            .calls
            .lock()
            .iter()
            .filter(|c| c.method == method)
            .map(|c| c.host.clone())
            .collect()
    }

    /// The slot the last attempt at `method` was resolved on.
    #[must_use]
    pub fn slot_of(&self, method: &str) -> Option<u8> {
        self.state
            .calls
            .lock()
            .iter()
            .rev()
            .find(|c| c.method == method)
            .map(|c| c.slot)
    }

    /// The last successfully delivered or broadcast message.
    #[must_use]
    pub fn last_message(&self) -> Option<EncodedMessage> {
        self.state.last_message.lock().clone()
    }

    /// The correlation ID of the most recent attempt.
    #[must_use]
    pub fn last_correlation(&self) -> Option<String> {
        self.state
            .calls
            .lock()
            .last()
            .and_then(|c| c.correlation.clone())
    }

    /// Current members of a group on a host.
    #[must_use]
    pub fn group_members(&self, host: &str, group: &str) -> Vec<i64> {
        self.state
            .groups
            .lock()
            .get(host)
            .and_then(|groups| groups.get(group))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChannelResolver for MemoryGateway {
    async fn resolve(
        &self,
        _role: &SocketRole,
        host: &str,
        slot: ServiceSlot,
    ) -> Result<Arc<dyn GatewayChannel>, TransportError> {
        Ok(Arc::new(MemoryChannel {
            host: host.to_owned(),
            slot,
            state: Arc::clone(&self.state),
        }))
    }
}

/// Channel to one fake host on one slot.
struct MemoryChannel {
    host: String,
    slot: ServiceSlot,
    state: Arc<FleetState>,
}

impl MemoryChannel {
    /// Record the attempt; fail it if the host is marked failing.
    fn attempt(&self, method: &str, ctx: &CallContext) -> Result<(), TransportError> {
        let ok = !self.state.failing.lock().contains(&self.host);
        self.state.calls.lock().push(RecordedCall {
            host: self.host.clone(),
            method: method.to_owned(),
            slot: self.slot.index(),
            ok,
            correlation: ctx.correlation_id.clone(),
        });
        if ok {
            Ok(())
        } else {
            Err(TransportError::new(&self.host, method, "host marked failing"))
        }
    }
}

#[async_trait]
impl GatewayChannel for MemoryChannel {
    async fn bind_identity(
        &self,
        ctx: &CallContext,
        conn: ConnDescriptor,
        identity: &BoundIdentity,
    ) -> Result<(), TransportError> {
        self.attempt("bind_identity", ctx)?;
        self.state.bound.lock().push((
            self.host.clone(),
            conn.value(),
            identity.kind.clone(),
            identity.id.clone(),
        ));
        Ok(())
    }

    async fn unbind_identity(
        &self,
        ctx: &CallContext,
        conn: ConnDescriptor,
    ) -> Result<(), TransportError> {
        self.attempt("unbind_identity", ctx)?;
        self.state
            .bound
            .lock()
            .retain(|(host, bound_conn, _, _)| !(host == &self.host && *bound_conn == conn.value()));
        Ok(())
    }

    async fn identity_bound(
        &self,
        ctx: &CallContext,
        identity: &BoundIdentity,
    ) -> Result<bool, TransportError> {
        self.attempt("identity_bound", ctx)?;
        Ok(self
            .state
            .bound
            .lock()
            .iter()
            .any(|(host, _, kind, id)| host == &self.host && kind == &identity.kind && id == &identity.id))
    }

    async fn bind_proxy(
        &self,
        ctx: &CallContext,
        _conn: ConnDescriptor,
        _target: &str,
    ) -> Result<(), TransportError> {
        self.attempt("bind_proxy", ctx)
    }

    async fn unbind_proxy(
        &self,
        ctx: &CallContext,
        _conn: ConnDescriptor,
    ) -> Result<(), TransportError> {
        self.attempt("unbind_proxy", ctx)
    }

    async fn connection_info(
        &self,
        ctx: &CallContext,
        conn: ConnDescriptor,
    ) -> Result<ConnectionInfo, TransportError> {
        self.attempt("connection_info", ctx)?;
        let identities = self
            .state
            .bound
            .lock()
            .iter()
            .filter(|(host, bound_conn, _, _)| host == &self.host && *bound_conn == conn.value())
            .map(|(_, _, kind, id)| BoundIdentity::new(kind.clone(), id.clone()))
            .collect();
        Ok(ConnectionInfo {
            conn,
            remote_addr: format!("test-peer-{conn}"),
            identities,
        })
    }

    async fn send_message(
        &self,
        ctx: &CallContext,
        _target: &MessageTarget,
        message: &EncodedMessage,
    ) -> Result<(), TransportError> {
        self.attempt("send_message", ctx)?;
        *self.state.last_message.lock() = Some(message.clone());
        Ok(())
    }

    async fn join_group(
        &self,
        ctx: &CallContext,
        group: &str,
        member: &GroupMember,
    ) -> Result<(), TransportError> {
        self.attempt("join_group", ctx)?;
        let mut groups = self.state.groups.lock();
        let members = groups
            .entry(self.host.clone())
            .or_default()
            .entry(group.to_owned())
            .or_default();
        if !members.contains(&member.conn.value()) {
            members.push(member.conn.value());
        }
        Ok(())
    }

    async fn leave_group(
        &self,
        ctx: &CallContext,
        group: &str,
        conn: ConnDescriptor,
    ) -> Result<(), TransportError> {
        self.attempt("leave_group", ctx)?;
        let mut groups = self.state.groups.lock();
        if let Some(members) = groups.get_mut(&self.host).and_then(|g| g.get_mut(group)) {
            members.retain(|member| *member != conn.value());
        }
        Ok(())
    }

    async fn broadcast_group(
        &self,
        ctx: &CallContext,
        _group: &str,
        message: &EncodedMessage,
        _exclude_id: &str,
    ) -> Result<(), TransportError> {
        self.attempt("broadcast_group", ctx)?;
        *self.state.last_message.lock() = Some(message.clone());
        Ok(())
    }

    async fn set_balance_hint(
        &self,
        ctx: &CallContext,
        _conn: ConnDescriptor,
        _hint: u32,
    ) -> Result<(), TransportError> {
        self.attempt("set_balance_hint", ctx)
    }
}
