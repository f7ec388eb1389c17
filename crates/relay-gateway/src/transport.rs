//! The consumed gateway transport capability.
//!
//! A gateway host multiplexes three remote services over one pooled
//! connection, addressed by slot index. The resolver hands out reusable
//! channels keyed by (role, host, slot); whether that means a fresh dial or a
//! pooled connection is the transport implementation's business.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use relay_core::{Action, BoundIdentity, BoundIdentitySet, CallContext, ConnDescriptor, SocketRole};

use crate::errors::TransportError;

/// Service slots multiplexed per gateway host connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceSlot {
    /// Identity/proxy binding service.
    Bind,
    /// Message delivery service.
    Message,
    /// Group pub/sub service.
    Group,
}

impl ServiceSlot {
    /// The slot's connection-pool index.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Bind => 0,
            Self::Message => 1,
            Self::Group => 2,
        }
    }
}

/// Metadata snapshot of one live connection on a gateway.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// The connection descriptor.
    pub conn: ConnDescriptor,
    /// Remote peer address as the gateway sees it.
    pub remote_addr: String,
    /// Identities currently bound to the connection.
    pub identities: BoundIdentitySet,
}

/// Delivery target of a message send.
#[derive(Clone, Debug)]
pub enum MessageTarget {
    /// One specific connection.
    Conn(ConnDescriptor),
    /// Whichever connection the identity is bound to.
    Identity(BoundIdentity),
}

/// Group membership record for joins.
#[derive(Clone, Debug)]
pub struct GroupMember {
    /// The member's connection.
    pub conn: ConnDescriptor,
    /// The member's external ID within the group.
    pub id: String,
}

/// A message pre-encoded in both wire formats.
///
/// The receiving gateway picks which encoding to relay: its WSS and TCP
/// clients may decode differently, and this side cannot know which.
#[derive(Clone, Debug)]
pub struct EncodedMessage {
    /// The action announced to the client.
    pub action: Action,
    /// Binary-format payload bytes.
    pub binary: Vec<u8>,
    /// JSON-format payload bytes.
    pub json: Vec<u8>,
}

/// The remote surface of one gateway host.
///
/// Channels are reusable and safe for concurrent calls; timeout and retry
/// behavior belongs to the transport implementation underneath.
#[async_trait]
pub trait GatewayChannel: Send + Sync {
    /// Bind an external identity to a connection.
    async fn bind_identity(
        &self,
        ctx: &CallContext,
        conn: ConnDescriptor,
        identity: &BoundIdentity,
    ) -> Result<(), TransportError>;

    /// Remove all identity bindings from a connection.
    async fn unbind_identity(
        &self,
        ctx: &CallContext,
        conn: ConnDescriptor,
    ) -> Result<(), TransportError>;

    /// Whether an identity is bound on this host.
    async fn identity_bound(
        &self,
        ctx: &CallContext,
        identity: &BoundIdentity,
    ) -> Result<bool, TransportError>;

    /// Bind a downstream proxy target to a connection.
    async fn bind_proxy(
        &self,
        ctx: &CallContext,
        conn: ConnDescriptor,
        target: &str,
    ) -> Result<(), TransportError>;

    /// Remove a connection's downstream proxy target.
    async fn unbind_proxy(
        &self,
        ctx: &CallContext,
        conn: ConnDescriptor,
    ) -> Result<(), TransportError>;

    /// Fetch live metadata for a connection.
    async fn connection_info(
        &self,
        ctx: &CallContext,
        conn: ConnDescriptor,
    ) -> Result<ConnectionInfo, TransportError>;

    /// Deliver a message to a connection or bound identity on this host.
    async fn send_message(
        &self,
        ctx: &CallContext,
        target: &MessageTarget,
        message: &EncodedMessage,
    ) -> Result<(), TransportError>;

    /// Add a member to a pub/sub group.
    async fn join_group(
        &self,
        ctx: &CallContext,
        group: &str,
        member: &GroupMember,
    ) -> Result<(), TransportError>;

    /// Remove a connection from a pub/sub group.
    async fn leave_group(
        &self,
        ctx: &CallContext,
        group: &str,
        conn: ConnDescriptor,
    ) -> Result<(), TransportError>;

    /// Broadcast a message to a group on this host.
    ///
    /// `exclude_id` names a member to skip (typically the sender); empty
    /// excludes nobody.
    async fn broadcast_group(
        &self,
        ctx: &CallContext,
        group: &str,
        message: &EncodedMessage,
        exclude_id: &str,
    ) -> Result<(), TransportError>;

    /// Set a per-connection load-balance hint.
    async fn set_balance_hint(
        &self,
        ctx: &CallContext,
        conn: ConnDescriptor,
        hint: u32,
    ) -> Result<(), TransportError>;
}

/// Resolves a reusable channel to one gateway host.
#[async_trait]
pub trait ChannelResolver: Send + Sync {
    /// Obtain (or reuse) the channel for (role, host, slot).
    async fn resolve(
        &self,
        role: &SocketRole,
        host: &str,
        slot: ServiceSlot,
    ) -> Result<Arc<dyn GatewayChannel>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_indices_are_stable() {
        assert_eq!(ServiceSlot::Bind.index(), 0);
        assert_eq!(ServiceSlot::Message.index(), 1);
        assert_eq!(ServiceSlot::Group.index(), 2);
    }

    #[test]
    fn connection_info_serde_roundtrip() {
        let info = ConnectionInfo {
            conn: ConnDescriptor::new(4),
            remote_addr: "203.0.113.9:51122".into(),
            identities: [BoundIdentity::new("user", "u-4")].into_iter().collect(),
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: ConnectionInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.conn, info.conn);
        assert_eq!(back.identities.get("user"), Some("u-4"));
    }
}
