//! Handler-process wiring and lifecycle.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use relay_codec::{CodecProvider, StructureFactory};
use relay_core::{Action, ActionId, SocketRole};
use relay_dispatch::{ActionHandler, Dispatcher, TableProvider};
use relay_gateway::{ChannelResolver, GatewayClient, LoggingObserver};
use relay_registry::{HostSet, MembershipWatcher, Registry, RegistrationPublisher};

use crate::config::HandlerConfig;
use crate::errors::ServerError;
use crate::service::HandlerService;

/// A `listen` call waiting for startup to apply it.
struct PendingRegistration {
    channel: String,
    action: Action,
    structure: Option<StructureFactory>,
    handler: Arc<dyn ActionHandler>,
}

/// One handler instance: dispatch tables, gateway clients, membership
/// watchers, and the registration lifecycle.
///
/// Startup order in [`run`](Self::run): watch gateway membership, apply
/// queued action registrations, publish them to the registry, then flip
/// ready. Publication failure aborts startup — an unregistered handler must
/// not serve. [`shutdown`](Self::shutdown) withdraws registrations
/// best-effort; the registry TTL is the backstop.
pub struct HandlerServer {
    config: HandlerConfig,
    tables: Arc<TableProvider>,
    dispatcher: Arc<Dispatcher>,
    tcp_gateway: GatewayClient,
    wss_gateway: GatewayClient,
    tcp_watcher: MembershipWatcher,
    wss_watcher: MembershipWatcher,
    publisher: RegistrationPublisher,
    listeners: Mutex<Vec<PendingRegistration>>,
    published: Mutex<Vec<Action>>,
    ready: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl HandlerServer {
    /// Wire up a handler instance over the given registry and transport.
    #[must_use]
    pub fn new(
        config: HandlerConfig,
        registry: Arc<dyn Registry>,
        resolver: Arc<dyn ChannelResolver>,
    ) -> Self {
        let tables = Arc::new(TableProvider::new());
        let codecs = Arc::new(CodecProvider::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&tables), Arc::clone(&codecs)));

        let tcp_hosts = Arc::new(HostSet::new());
        let wss_hosts = Arc::new(HostSet::new());

        let tcp_gateway = GatewayClient::new(
            SocketRole::Tcp,
            Arc::clone(&tcp_hosts),
            Arc::clone(&codecs),
            Arc::clone(&resolver),
        );
        tcp_gateway.add_observer(Arc::new(LoggingObserver));
        let wss_gateway = GatewayClient::new(
            SocketRole::Wss,
            Arc::clone(&wss_hosts),
            Arc::clone(&codecs),
            resolver,
        );
        wss_gateway.add_observer(Arc::new(LoggingObserver));

        let tcp_watcher =
            MembershipWatcher::new(SocketRole::Tcp, Arc::clone(&registry), tcp_hosts);
        let wss_watcher =
            MembershipWatcher::new(SocketRole::Wss, Arc::clone(&registry), wss_hosts);

        let publisher = RegistrationPublisher::new(
            registry,
            config.register_prefix.clone(),
            config.handler_id(),
            config.host_addr.clone(),
            Duration::from_secs(config.register_ttl_secs),
        )
        .with_balance_weight(config.balance_weight);

        Self {
            config,
            tables,
            dispatcher,
            tcp_gateway,
            wss_gateway,
            tcp_watcher,
            wss_watcher,
            publisher,
            listeners: Mutex::new(Vec::new()),
            published: Mutex::new(Vec::new()),
            ready: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
        }
    }

    /// This instance's configuration.
    #[must_use]
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Queue an action registration, applied when [`run`](Self::run) starts.
    pub fn listen(
        &self,
        channel: impl Into<String>,
        action: Action,
        structure: Option<StructureFactory>,
        handler: Arc<dyn ActionHandler>,
    ) {
        self.listeners.lock().push(PendingRegistration {
            channel: channel.into(),
            action,
            structure,
            handler,
        });
    }

    /// The inbound RPC surface to expose through the transport server.
    #[must_use]
    pub fn service(&self) -> HandlerService {
        HandlerService::new(Arc::clone(&self.dispatcher), Arc::clone(&self.ready))
    }

    /// Client for the TCP gateway fleet.
    #[must_use]
    pub fn tcp_gateway(&self) -> &GatewayClient {
        &self.tcp_gateway
    }

    /// Client for the WSS gateway fleet.
    #[must_use]
    pub fn wss_gateway(&self) -> &GatewayClient {
        &self.wss_gateway
    }

    /// The dispatcher behind the inbound surface.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Whether startup completed and dispatches are accepted.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Token cancelled when [`shutdown`](Self::shutdown) runs.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start serving: watch membership, register actions, go ready.
    pub async fn run(&self) -> Result<(), ServerError> {
        if self.config.host_addr.is_empty() {
            return Err(ServerError::config("handler rpc address required"));
        }
        info!(handler = self.config.handler_id(), "init start");

        self.tcp_watcher.start().await?;
        self.wss_watcher.start().await?;
        debug!("gateway membership watch started");

        let pending = std::mem::take(&mut *self.listeners.lock());
        for registration in pending {
            debug!(
                channel = registration.channel,
                action = %registration.action,
                "listened action"
            );
            self.tables.table(&registration.channel).register(
                registration.action,
                registration.structure,
                registration.handler,
            );
        }
        info!("listen actions initialized");

        let actions = self.collect_actions();
        self.publisher.publish(&actions).await?;
        *self.published.lock() = actions;
        debug!("actions registered");

        self.ready.store(true, Ordering::Release);
        info!(host = self.config.host_addr, "handler serving");
        Ok(())
    }

    /// Stop serving: close watchers, withdraw registrations, cancel the token.
    pub async fn shutdown(&self) {
        self.ready.store(false, Ordering::Release);
        self.tcp_watcher.close();
        self.wss_watcher.close();

        let published = std::mem::take(&mut *self.published.lock());
        self.publisher.withdraw(&published).await;

        self.shutdown.cancel();
        info!(handler = self.config.handler_id(), "released");
    }

    /// Every action across all channels, de-duplicated by ID.
    ///
    /// Registration keys are keyed by action ID, not channel, so an ID shared
    /// between channels publishes once.
    fn collect_actions(&self) -> Vec<Action> {
        let mut by_id: BTreeMap<ActionId, Action> = BTreeMap::new();
        for channel in self.tables.channels() {
            for action in self.tables.table(&channel).actions() {
                let _ = by_id.entry(action.id).or_insert(action);
            }
        }
        by_id.into_values().collect()
    }
}
