//! Action registration publishing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use relay_core::Action;

use crate::errors::RegistryError;
use crate::keys;
use crate::registry::Registry;

/// Publishes the actions a handler instance serves.
///
/// One registry key per (handler-host, action) pair, value `name` or
/// `name|weight`, TTL-enforced by the registry. Publication failures are
/// fatal to startup — downstream routers would never learn to route traffic
/// to an unregistered handler. Withdrawal failures are logged only; the TTL
/// expiry is the backstop.
pub struct RegistrationPublisher {
    registry: Arc<dyn Registry>,
    prefix: String,
    handler_id: String,
    host_addr: String,
    ttl: Duration,
    balance_weight: Option<u32>,
}

impl RegistrationPublisher {
    /// Create a publisher for one handler instance.
    #[must_use]
    pub fn new(
        registry: Arc<dyn Registry>,
        prefix: impl Into<String>,
        handler_id: impl Into<String>,
        host_addr: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            registry,
            prefix: prefix.into(),
            handler_id: handler_id.into(),
            host_addr: host_addr.into(),
            ttl,
            balance_weight: None,
        }
    }

    /// Attach a load-balance weight, appended to every value as `name|weight`.
    ///
    /// Zero means unweighted.
    #[must_use]
    pub fn with_balance_weight(mut self, weight: u32) -> Self {
        self.balance_weight = (weight > 0).then_some(weight);
        self
    }

    /// The registration key for one action.
    #[must_use]
    pub fn key(&self, action: &Action) -> String {
        keys::registration_key(&self.prefix, &self.handler_id, &self.host_addr, action.id)
    }

    /// Register every action. The first failure aborts and is returned.
    pub async fn publish(&self, actions: &[Action]) -> Result<(), RegistryError> {
        for action in actions {
            let key = self.key(action);
            let value = keys::registration_value(action, self.balance_weight);
            self.registry.register(&key, &value, self.ttl).await?;
            debug!(key, value, "registered action");
        }
        Ok(())
    }

    /// Unregister every action, best-effort.
    ///
    /// Failures are logged and skipped; the registry's TTL expiry cleans up
    /// whatever remains.
    pub async fn withdraw(&self, actions: &[Action]) {
        for action in actions {
            let key = self.key(action);
            match self.registry.unregister(&key).await {
                Ok(()) => debug!(key, "unregistered action"),
                Err(err) => warn!(key, error = %err, "unregister failed, leaving key to TTL expiry"),
            }
        }
    }
}
