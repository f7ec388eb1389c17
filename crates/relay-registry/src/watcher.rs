//! Gateway membership watching.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::debug;

use relay_core::SocketRole;

use crate::errors::RegistryError;
use crate::hostset::HostSet;
use crate::keys;
use crate::registry::{Registry, WatchEvent, WatchEventKind};

/// Lifecycle state of a [`MembershipWatcher`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WatcherState {
    /// Created but not yet subscribed.
    Uninitialized = 0,
    /// Subscribed; notifications mutate the host set.
    Watching = 1,
    /// Shut down; further notifications are ignored.
    Closed = 2,
}

impl WatcherState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Watching,
            2 => Self::Closed,
            _ => Self::Uninitialized,
        }
    }
}

/// Sole writer of one role's [`HostSet`].
///
/// Subscribes to the role's registry prefix and translates add/remove
/// notifications into host-set mutations. The host is derived from the final
/// path segment of the notified key. Watchers for different roles run
/// independently; handling one role's notifications never blocks another's.
pub struct MembershipWatcher {
    role: SocketRole,
    prefix: String,
    registry: Arc<dyn Registry>,
    hosts: Arc<HostSet>,
    state: Arc<AtomicU8>,
}

impl MembershipWatcher {
    /// Create a watcher for a role, writing into the given host set.
    #[must_use]
    pub fn new(role: SocketRole, registry: Arc<dyn Registry>, hosts: Arc<HostSet>) -> Self {
        let prefix = keys::gateway_prefix(&role);
        Self {
            role,
            prefix,
            registry,
            hosts,
            state: Arc::new(AtomicU8::new(WatcherState::Uninitialized as u8)),
        }
    }

    /// The role this watcher maintains membership for.
    #[must_use]
    pub fn role(&self) -> &SocketRole {
        &self.role
    }

    /// The registry prefix being watched.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WatcherState {
        WatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Subscribe and transition `Uninitialized → Watching`.
    ///
    /// A subscription failure is surfaced synchronously and leaves the
    /// watcher uninitialized — callers treat it as startup-blocking.
    pub async fn start(&self) -> Result<(), RegistryError> {
        let role = self.role.clone();
        let hosts = Arc::clone(&self.hosts);
        let state = Arc::clone(&self.state);

        let on_event = Arc::new(move |event: WatchEvent| {
            if state.load(Ordering::Acquire) == WatcherState::Closed as u8 {
                return;
            }
            let host = keys::host_from_key(&event.key);
            if host.is_empty() {
                return;
            }
            match event.kind {
                WatchEventKind::Put => {
                    if hosts.add(host) {
                        debug!(role = %role, host, "gateway joined");
                    }
                }
                WatchEventKind::Delete => {
                    if hosts.remove(host) {
                        debug!(role = %role, host, "gateway left");
                    }
                }
            }
        });

        self.registry.watch(&self.prefix, on_event).await?;
        self.state
            .store(WatcherState::Watching as u8, Ordering::Release);
        Ok(())
    }

    /// Transition to `Closed`; subsequent notifications are ignored.
    ///
    /// The host set contents are abandoned as-is — the registry client owns
    /// the subscription lifecycle.
    pub fn close(&self) {
        self.state
            .store(WatcherState::Closed as u8, Ordering::Release);
        debug!(role = %self.role, "membership watcher closed");
    }
}
