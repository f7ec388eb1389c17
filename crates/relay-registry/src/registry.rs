//! The consumed registry capability.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::RegistryError;

/// Whether a watch notification reports a key appearing or disappearing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchEventKind {
    /// The key was registered or refreshed.
    Put,
    /// The key was unregistered or its TTL expired.
    Delete,
}

/// One notification delivered to a prefix watch.
#[derive(Clone, Debug)]
pub struct WatchEvent {
    /// Full `/`-delimited key the event concerns.
    pub key: String,
    /// Value registered under the key (empty on delete).
    pub value: String,
    /// Add or remove.
    pub kind: WatchEventKind,
}

/// Callback invoked for every event under a watched prefix.
pub type WatchCallback = Arc<dyn Fn(WatchEvent) + Send + Sync>;

/// Key/value registration service with TTL renewal and prefix watching.
///
/// Consumed as a capability: consensus, storage, and lease renewal are the
/// registry implementation's business, not this crate's.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Register `key -> value` with a time-to-live.
    async fn register(&self, key: &str, value: &str, ttl: Duration) -> Result<(), RegistryError>;

    /// Atomically remove a key.
    async fn unregister(&self, key: &str) -> Result<(), RegistryError>;

    /// Subscribe to add/remove events for keys under `prefix`.
    ///
    /// The subscription lives for the registry client's lifetime; there is no
    /// explicit unsubscribe. Implementations deliver events for keys already
    /// present at subscription time as initial `Put` events.
    async fn watch(&self, prefix: &str, on_event: WatchCallback) -> Result<(), RegistryError>;
}
