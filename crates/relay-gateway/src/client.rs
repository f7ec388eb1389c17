//! High-level gateway operations with per-operation fan-out policy.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use relay_codec::{CodecProvider, PayloadStructure, WireFormat};
use relay_core::{Action, BoundIdentity, CallContext, ConnDescriptor, SocketRole};
use relay_registry::HostSet;

use crate::errors::{GatewayError, TransportError};
use crate::observer::CallObserver;
use crate::transport::{
    ChannelResolver, ConnectionInfo, EncodedMessage, GatewayChannel, GroupMember, MessageTarget,
    ServiceSlot,
};

/// Client for one downstream gateway role.
///
/// Every operation follows the same two-phase pattern: resolve a channel to a
/// specific host, invoke the remote call, and translate transport failures
/// into the operation's return value. Single-host operations propagate the
/// first error; the `*_any` and `*_all` variants apply their documented
/// fan-out policies over an atomic snapshot of the role's host set.
///
/// Host arguments may carry a legacy embedded correlation tag
/// (`<id>:@<host>`); the tag is peeled into the call context and never
/// affects routing.
#[derive(Clone)]
pub struct GatewayClient {
    role: SocketRole,
    hosts: Arc<HostSet>,
    codecs: Arc<CodecProvider>,
    resolver: Arc<dyn ChannelResolver>,
    observers: Arc<RwLock<Vec<Arc<dyn CallObserver>>>>,
}

impl GatewayClient {
    /// Create a client for a role over the given host set and transport.
    #[must_use]
    pub fn new(
        role: SocketRole,
        hosts: Arc<HostSet>,
        codecs: Arc<CodecProvider>,
        resolver: Arc<dyn ChannelResolver>,
    ) -> Self {
        Self {
            role,
            hosts,
            codecs,
            resolver,
            observers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The role this client talks to.
    #[must_use]
    pub fn role(&self) -> &SocketRole {
        &self.role
    }

    /// The role's live host set.
    #[must_use]
    pub fn hosts(&self) -> &Arc<HostSet> {
        &self.hosts
    }

    /// Register a post-call observer.
    pub fn add_observer(&self, observer: Arc<dyn CallObserver>) {
        self.observers.write().push(observer);
    }

    fn observe(&self, host: &str, method: &str, error: Option<&TransportError>) {
        for observer in self.observers.read().iter() {
            observer.after_call(&self.role, host, method, error);
        }
    }

    /// Peel a legacy embedded correlation tag off a host argument.
    fn effective<'a>(&self, ctx: &CallContext, host: &'a str) -> (CallContext, &'a str) {
        match CallContext::split_tagged_host(host) {
            (Some(tag), bare) => (CallContext::with_correlation(tag), bare),
            (None, bare) => (ctx.clone(), bare),
        }
    }

    async fn channel(
        &self,
        host: &str,
        slot: ServiceSlot,
    ) -> Result<Arc<dyn GatewayChannel>, TransportError> {
        self.resolver.resolve(&self.role, host, slot).await
    }

    /// Pre-encode a payload in both wire formats for message delivery.
    pub fn encode_message(
        &self,
        action: &Action,
        payload: &dyn PayloadStructure,
    ) -> Result<EncodedMessage, GatewayError> {
        let binary = payload.encode_with(self.codecs.get(WireFormat::Binary))?;
        let json = payload.encode_with(self.codecs.get(WireFormat::Json))?;
        Ok(EncodedMessage {
            action: action.clone(),
            binary,
            json,
        })
    }

    // ── Identity binding ────────────────────────────────────────────

    /// Bind an external identity to a connection on one host.
    pub async fn bind_identity(
        &self,
        ctx: &CallContext,
        host: &str,
        conn: ConnDescriptor,
        identity: &BoundIdentity,
    ) -> Result<(), GatewayError> {
        let (ctx, host) = self.effective(ctx, host);
        let channel = self.channel(host, ServiceSlot::Bind).await?;
        let result = channel.bind_identity(&ctx, conn, identity).await;
        self.observe(host, "bind_identity", result.as_ref().err());
        result.map_err(Into::into)
    }

    /// Remove all identity bindings from a connection on one host.
    pub async fn unbind_identity(
        &self,
        ctx: &CallContext,
        host: &str,
        conn: ConnDescriptor,
    ) -> Result<(), GatewayError> {
        let (ctx, host) = self.effective(ctx, host);
        let channel = self.channel(host, ServiceSlot::Bind).await?;
        let result = channel.unbind_identity(&ctx, conn).await;
        self.observe(host, "unbind_identity", result.as_ref().err());
        result.map_err(Into::into)
    }

    /// Whether an identity is bound on one host.
    pub async fn identity_bound(
        &self,
        ctx: &CallContext,
        host: &str,
        identity: &BoundIdentity,
    ) -> Result<bool, GatewayError> {
        let (ctx, host) = self.effective(ctx, host);
        let channel = self.channel(host, ServiceSlot::Bind).await?;
        let result = channel.identity_bound(&ctx, identity).await;
        self.observe(host, "identity_bound", result.as_ref().err());
        result.map_err(Into::into)
    }

    /// Whether an identity is bound on any known host.
    ///
    /// Hosts are probed in set order; the first host reporting bound wins. A
    /// transport failure aborts immediately — it is never mistaken for "not
    /// bound". An empty host set means not bound anywhere.
    pub async fn identity_bound_any(
        &self,
        ctx: &CallContext,
        identity: &BoundIdentity,
    ) -> Result<bool, GatewayError> {
        for host in self.hosts.snapshot() {
            if self.identity_bound(ctx, &host, identity).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ── Proxy binding ───────────────────────────────────────────────

    /// Bind a downstream proxy target to a connection on one host.
    pub async fn bind_proxy(
        &self,
        ctx: &CallContext,
        host: &str,
        conn: ConnDescriptor,
        target: &str,
    ) -> Result<(), GatewayError> {
        let (ctx, host) = self.effective(ctx, host);
        let channel = self.channel(host, ServiceSlot::Bind).await?;
        let result = channel.bind_proxy(&ctx, conn, target).await;
        self.observe(host, "bind_proxy", result.as_ref().err());
        result.map_err(Into::into)
    }

    /// Remove a connection's downstream proxy target on one host.
    pub async fn unbind_proxy(
        &self,
        ctx: &CallContext,
        host: &str,
        conn: ConnDescriptor,
    ) -> Result<(), GatewayError> {
        let (ctx, host) = self.effective(ctx, host);
        let channel = self.channel(host, ServiceSlot::Bind).await?;
        let result = channel.unbind_proxy(&ctx, conn).await;
        self.observe(host, "unbind_proxy", result.as_ref().err());
        result.map_err(Into::into)
    }

    /// Fetch live metadata for a connection on one host.
    pub async fn connection_info(
        &self,
        ctx: &CallContext,
        host: &str,
        conn: ConnDescriptor,
    ) -> Result<ConnectionInfo, GatewayError> {
        let (ctx, host) = self.effective(ctx, host);
        let channel = self.channel(host, ServiceSlot::Bind).await?;
        let result = channel.connection_info(&ctx, conn).await;
        self.observe(host, "connection_info", result.as_ref().err());
        result.map_err(Into::into)
    }

    // ── Message delivery ────────────────────────────────────────────

    /// Deliver a message to one connection on one host.
    pub async fn send_conn_message(
        &self,
        ctx: &CallContext,
        host: &str,
        conn: ConnDescriptor,
        action: &Action,
        payload: &dyn PayloadStructure,
    ) -> Result<(), GatewayError> {
        let message = self.encode_message(action, payload)?;
        self.send_encoded(ctx, host, &MessageTarget::Conn(conn), &message)
            .await
            .map_err(Into::into)
    }

    /// Deliver a message to a bound identity on one host.
    pub async fn send_identity_message(
        &self,
        ctx: &CallContext,
        host: &str,
        identity: &BoundIdentity,
        action: &Action,
        payload: &dyn PayloadStructure,
    ) -> Result<(), GatewayError> {
        let message = self.encode_message(action, payload)?;
        self.send_encoded(
            ctx,
            host,
            &MessageTarget::Identity(identity.clone()),
            &message,
        )
        .await
        .map_err(Into::into)
    }

    /// Deliver a message to a bound identity on whichever host accepts it.
    ///
    /// Hosts are tried in set order; the first accepted delivery wins. If
    /// every host fails, the last error is returned. An empty host set is an
    /// error — a message with no gateway to carry it must not vanish
    /// silently.
    pub async fn send_identity_message_any(
        &self,
        ctx: &CallContext,
        identity: &BoundIdentity,
        action: &Action,
        payload: &dyn PayloadStructure,
    ) -> Result<(), GatewayError> {
        let message = self.encode_message(action, payload)?;
        let target = MessageTarget::Identity(identity.clone());
        let mut outcome = Err(GatewayError::no_hosts(&self.role));
        for host in self.hosts.snapshot() {
            match self.send_encoded(ctx, &host, &target, &message).await {
                Ok(()) => return Ok(()),
                Err(err) => outcome = Err(err.into()),
            }
        }
        outcome
    }

    async fn send_encoded(
        &self,
        ctx: &CallContext,
        host: &str,
        target: &MessageTarget,
        message: &EncodedMessage,
    ) -> Result<(), TransportError> {
        let (ctx, host) = self.effective(ctx, host);
        let channel = self.channel(host, ServiceSlot::Message).await?;
        let result = channel.send_message(&ctx, target, message).await;
        self.observe(host, "send_message", result.as_ref().err());
        result
    }

    // ── Group pub/sub ───────────────────────────────────────────────

    /// Add a member to a pub/sub group on one host.
    pub async fn join_group(
        &self,
        ctx: &CallContext,
        host: &str,
        group: &str,
        member: &GroupMember,
    ) -> Result<(), GatewayError> {
        let (ctx, host) = self.effective(ctx, host);
        let channel = self.channel(host, ServiceSlot::Group).await?;
        let result = channel.join_group(&ctx, group, member).await;
        self.observe(host, "join_group", result.as_ref().err());
        result.map_err(Into::into)
    }

    /// Remove a connection from a pub/sub group on one host.
    pub async fn leave_group(
        &self,
        ctx: &CallContext,
        host: &str,
        group: &str,
        conn: ConnDescriptor,
    ) -> Result<(), GatewayError> {
        let (ctx, host) = self.effective(ctx, host);
        let channel = self.channel(host, ServiceSlot::Group).await?;
        let result = channel.leave_group(&ctx, group, conn).await;
        self.observe(host, "leave_group", result.as_ref().err());
        result.map_err(Into::into)
    }

    /// Broadcast to a group on one host.
    pub async fn broadcast_group(
        &self,
        ctx: &CallContext,
        host: &str,
        group: &str,
        action: &Action,
        payload: &dyn PayloadStructure,
        exclude_id: &str,
    ) -> Result<(), GatewayError> {
        let message = self.encode_message(action, payload)?;
        self.broadcast_encoded(ctx, host, group, &message, exclude_id)
            .await
            .map_err(Into::into)
    }

    /// Broadcast to a group on every known host, in parallel.
    ///
    /// Best-effort: one concurrent task per host, individual failures logged
    /// and swallowed, returning only after every attempt completes.
    pub async fn broadcast_group_all(
        &self,
        ctx: &CallContext,
        group: &str,
        action: &Action,
        payload: &dyn PayloadStructure,
        exclude_id: &str,
    ) {
        let message = match self.encode_message(action, payload) {
            Ok(message) => Arc::new(message),
            Err(err) => {
                warn!(group, action = %action, error = %err, "broadcast payload encoding failed");
                return;
            }
        };

        let handles: Vec<_> = self
            .hosts
            .snapshot()
            .into_iter()
            .map(|host| {
                let client = self.clone();
                let ctx = ctx.clone();
                let group = group.to_owned();
                let exclude_id = exclude_id.to_owned();
                let message = Arc::clone(&message);
                tokio::spawn(async move {
                    if let Err(err) = client
                        .broadcast_encoded(&ctx, &host, &group, &message, &exclude_id)
                        .await
                    {
                        warn!(host, group, error = %err, "broadcast to gateway failed");
                    }
                })
            })
            .collect();

        let _ = futures::future::join_all(handles).await;
    }

    async fn broadcast_encoded(
        &self,
        ctx: &CallContext,
        host: &str,
        group: &str,
        message: &EncodedMessage,
        exclude_id: &str,
    ) -> Result<(), TransportError> {
        let (ctx, host) = self.effective(ctx, host);
        let channel = self.channel(host, ServiceSlot::Group).await?;
        let result = channel.broadcast_group(&ctx, group, message, exclude_id).await;
        self.observe(host, "broadcast_group", result.as_ref().err());
        result
    }

    // ── Load balancing ──────────────────────────────────────────────

    /// Set a per-connection load-balance hint on one host.
    pub async fn set_balance_hint(
        &self,
        ctx: &CallContext,
        host: &str,
        conn: ConnDescriptor,
        hint: u32,
    ) -> Result<(), GatewayError> {
        let (ctx, host) = self.effective(ctx, host);
        let channel = self.channel(host, ServiceSlot::Bind).await?;
        let result = channel.set_balance_hint(&ctx, conn, hint).await;
        self.observe(host, "set_balance_hint", result.as_ref().err());
        result.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGateway;
    use assert_matches::assert_matches;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Notice {
        text: String,
    }

    fn notice(text: &str) -> relay_codec::Structured<Notice> {
        relay_codec::Structured(Notice { text: text.into() })
    }

    fn make_client(gateway: &MemoryGateway) -> GatewayClient {
        GatewayClient::new(
            SocketRole::Tcp,
            Arc::new(HostSet::new()),
            Arc::new(CodecProvider::new()),
            gateway.resolver(),
        )
    }

    #[tokio::test]
    async fn bind_and_query_one_host() {
        let gateway = MemoryGateway::new();
        let client = make_client(&gateway);
        let user = BoundIdentity::new("user", "u-1");

        client
            .bind_identity(&CallContext::new(), "h1:1", ConnDescriptor::new(4), &user)
            .await
            .unwrap();
        assert!(client.identity_bound(&CallContext::new(), "h1:1", &user).await.unwrap());

        client
            .unbind_identity(&CallContext::new(), "h1:1", ConnDescriptor::new(4))
            .await
            .unwrap();
        assert!(!client.identity_bound(&CallContext::new(), "h1:1", &user).await.unwrap());
    }

    #[tokio::test]
    async fn single_host_failure_propagates() {
        let gateway = MemoryGateway::new();
        gateway.fail_host("down:1");
        let client = make_client(&gateway);

        let err = client
            .bind_identity(
                &CallContext::new(),
                "down:1",
                ConnDescriptor::new(1),
                &BoundIdentity::new("user", "u"),
            )
            .await
            .unwrap_err();
        assert_matches!(err, GatewayError::Transport(_));
    }

    #[tokio::test]
    async fn identity_bound_any_finds_first_match() {
        let gateway = MemoryGateway::new();
        let client = make_client(&gateway);
        let _ = client.hosts().add("h1:1");
        let _ = client.hosts().add("h2:1");
        let user = BoundIdentity::new("user", "u-1");

        client
            .bind_identity(&CallContext::new(), "h2:1", ConnDescriptor::new(9), &user)
            .await
            .unwrap();

        assert!(client.identity_bound_any(&CallContext::new(), &user).await.unwrap());
        // Both hosts were consulted in order; h1 first, then h2.
        let probes = gateway.calls_for("identity_bound");
        assert_eq!(probes, vec!["h1:1", "h2:1"]);
    }

    #[tokio::test]
    async fn identity_bound_any_error_aborts_immediately() {
        let gateway = MemoryGateway::new();
        gateway.fail_host("h1:1");
        let client = make_client(&gateway);
        let _ = client.hosts().add("h1:1");
        let _ = client.hosts().add("h2:1");

        let err = client
            .identity_bound_any(&CallContext::new(), &BoundIdentity::new("user", "u"))
            .await
            .unwrap_err();
        assert_matches!(err, GatewayError::Transport(_));
        // The failure must not be treated as "not bound": h2 was never probed.
        assert!(gateway.calls_for("identity_bound").is_empty());
    }

    #[tokio::test]
    async fn identity_bound_any_empty_set_is_false() {
        let gateway = MemoryGateway::new();
        let client = make_client(&gateway);
        assert!(
            !client
                .identity_bound_any(&CallContext::new(), &BoundIdentity::new("user", "u"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn send_any_returns_on_first_success() {
        let gateway = MemoryGateway::new();
        gateway.fail_host("h1:1");
        let client = make_client(&gateway);
        let _ = client.hosts().add("h1:1");
        let _ = client.hosts().add("h2:1");

        client
            .send_identity_message_any(
                &CallContext::new(),
                &BoundIdentity::new("user", "u-1"),
                &Action::new(200, "notice"),
                &notice("hi"),
            )
            .await
            .unwrap();

        // h1 failed, h2 was attempted and accepted.
        assert_eq!(gateway.calls_for("send_message"), vec!["h2:1"]);
    }

    #[tokio::test]
    async fn send_any_returns_last_error_when_all_fail() {
        let gateway = MemoryGateway::new();
        gateway.fail_host("h1:1");
        gateway.fail_host("h2:1");
        let client = make_client(&gateway);
        let _ = client.hosts().add("h1:1");
        let _ = client.hosts().add("h2:1");

        let err = client
            .send_identity_message_any(
                &CallContext::new(),
                &BoundIdentity::new("user", "u-1"),
                &Action::new(200, "notice"),
                &notice("hi"),
            )
            .await
            .unwrap_err();
        assert_matches!(err, GatewayError::Transport(ref t) if t.host == "h2:1");
    }

    #[tokio::test]
    async fn send_any_empty_set_is_an_error() {
        let gateway = MemoryGateway::new();
        let client = make_client(&gateway);

        let err = client
            .send_identity_message_any(
                &CallContext::new(),
                &BoundIdentity::new("user", "u-1"),
                &Action::new(200, "notice"),
                &notice("hi"),
            )
            .await
            .unwrap_err();
        assert_matches!(err, GatewayError::NoHosts { .. });
    }

    #[tokio::test]
    async fn messages_carry_both_encodings() {
        let gateway = MemoryGateway::new();
        let client = make_client(&gateway);

        client
            .send_conn_message(
                &CallContext::new(),
                "h1:1",
                ConnDescriptor::new(3),
                &Action::new(200, "notice"),
                &notice("dual"),
            )
            .await
            .unwrap();

        let message = gateway.last_message().unwrap();
        let from_json: Notice = serde_json::from_slice(&message.json).unwrap();
        let from_binary: Notice = rmp_serde::from_slice(&message.binary).unwrap();
        assert_eq!(from_json, from_binary);
        assert_eq!(from_json.text, "dual");
    }

    #[tokio::test]
    async fn broadcast_all_is_a_barrier_and_swallows_failures() {
        let gateway = MemoryGateway::new();
        gateway.fail_host("h1:1");
        let client = make_client(&gateway);
        let _ = client.hosts().add("h1:1");
        let _ = client.hosts().add("h2:1");

        // No error surfaces even though h1 fails.
        client
            .broadcast_group_all(
                &CallContext::new(),
                "room-7",
                &Action::new(300, "room-update"),
                &notice("all"),
                "",
            )
            .await;

        // Barrier property: both hosts were attempted before return.
        let mut attempted = gateway.attempts_for("broadcast_group");
        attempted.sort();
        assert_eq!(attempted, vec!["h1:1", "h2:1"]);
    }

    #[tokio::test]
    async fn broadcast_all_with_no_hosts_is_a_no_op() {
        let gateway = MemoryGateway::new();
        let client = make_client(&gateway);
        client
            .broadcast_group_all(
                &CallContext::new(),
                "room-7",
                &Action::new(300, "room-update"),
                &notice("none"),
                "",
            )
            .await;
        assert!(gateway.attempts_for("broadcast_group").is_empty());
    }

    #[tokio::test]
    async fn group_and_balance_operations_use_expected_slots() {
        let gateway = MemoryGateway::new();
        let client = make_client(&gateway);
        let ctx = CallContext::new();

        client
            .join_group(&ctx, "h1:1", "room", &GroupMember { conn: ConnDescriptor::new(1), id: "u".into() })
            .await
            .unwrap();
        client.leave_group(&ctx, "h1:1", "room", ConnDescriptor::new(1)).await.unwrap();
        client.set_balance_hint(&ctx, "h1:1", ConnDescriptor::new(1), 8010).await.unwrap();
        client.bind_proxy(&ctx, "h1:1", ConnDescriptor::new(1), "backend-7").await.unwrap();
        client.unbind_proxy(&ctx, "h1:1", ConnDescriptor::new(1)).await.unwrap();
        let info = client.connection_info(&ctx, "h1:1", ConnDescriptor::new(1)).await.unwrap();
        assert_eq!(info.conn, ConnDescriptor::new(1));

        assert_eq!(gateway.slot_of("join_group"), Some(ServiceSlot::Group.index()));
        assert_eq!(gateway.slot_of("set_balance_hint"), Some(ServiceSlot::Bind.index()));
    }

    #[tokio::test]
    async fn tagged_host_is_routed_bare_and_tag_becomes_correlation() {
        let gateway = MemoryGateway::new();
        let client = make_client(&gateway);

        client
            .bind_identity(
                &CallContext::new(),
                "req-42:@h1:1",
                ConnDescriptor::new(2),
                &BoundIdentity::new("user", "u"),
            )
            .await
            .unwrap();

        // Routing saw the bare host only.
        assert_eq!(gateway.calls_for("bind_identity"), vec!["h1:1"]);
        assert_eq!(gateway.last_correlation().as_deref(), Some("req-42"));
    }

    #[tokio::test]
    async fn membership_changes_drive_fan_out_targets() {
        use relay_registry::{MembershipWatcher, MemoryRegistry, Registry};
        use std::time::Duration;

        let registry = Arc::new(MemoryRegistry::new());
        let hosts = Arc::new(HostSet::new());
        let watcher = MembershipWatcher::new(
            SocketRole::Tcp,
            Arc::clone(&registry) as Arc<dyn Registry>,
            Arc::clone(&hosts),
        );
        watcher.start().await.unwrap();

        let gateway = MemoryGateway::new();
        let client = GatewayClient::new(
            SocketRole::Tcp,
            hosts,
            Arc::new(CodecProvider::new()),
            gateway.resolver(),
        );

        // Joined host is included in the next all-hosts operation.
        registry
            .register("gateways/tcp/h9:1", "", Duration::from_secs(5))
            .await
            .unwrap();
        client
            .broadcast_group_all(&CallContext::new(), "room", &Action::new(1, "a"), &notice("x"), "")
            .await;
        assert_eq!(gateway.attempts_for("broadcast_group"), vec!["h9:1"]);

        // Departed host is excluded from all later all-hosts operations.
        registry.unregister("gateways/tcp/h9:1").await.unwrap();
        client
            .broadcast_group_all(&CallContext::new(), "room", &Action::new(1, "a"), &notice("x"), "")
            .await;
        assert_eq!(gateway.attempts_for("broadcast_group"), vec!["h9:1"]);
    }

    #[tokio::test]
    async fn observers_see_success_and_failure() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        struct Counting {
            ok: AtomicUsize,
            failed: AtomicUsize,
        }
        impl CallObserver for Counting {
            fn after_call(
                &self,
                _role: &SocketRole,
                _host: &str,
                _method: &str,
                error: Option<&TransportError>,
            ) {
                if error.is_some() {
                    let _ = self.failed.fetch_add(1, Ordering::SeqCst);
                } else {
                    let _ = self.ok.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let gateway = MemoryGateway::new();
        gateway.fail_host("down:1");
        let client = make_client(&gateway);
        let counting = Arc::new(Counting::default());
        client.add_observer(Arc::clone(&counting) as Arc<dyn CallObserver>);

        let ctx = CallContext::new();
        let user = BoundIdentity::new("user", "u");
        client.bind_identity(&ctx, "h1:1", ConnDescriptor::new(1), &user).await.unwrap();
        let _ = client.bind_identity(&ctx, "down:1", ConnDescriptor::new(1), &user).await;

        assert_eq!(counting.ok.load(Ordering::SeqCst), 1);
        assert_eq!(counting.failed.load(Ordering::SeqCst), 1);
    }
}
