//! Concurrent action tables and the per-channel table provider.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use tracing::warn;

use relay_codec::StructureFactory;
use relay_core::{Action, ActionId};

use crate::handler::{ActionHandler, ActionReply, HandlerRequest};

/// One registered action: metadata, optional payload structure factory, and
/// the handler.
#[derive(Clone)]
pub struct ActionEntry {
    /// Action metadata.
    pub action: Action,
    /// Factory for the decoded-payload shape; `None` for payload-less actions.
    pub structure: Option<StructureFactory>,
    /// The handler to invoke.
    pub handler: Arc<dyn ActionHandler>,
}

/// Ordered list of teardown handlers chained under the close sentinel.
#[derive(Default)]
struct TeardownChain {
    handlers: RwLock<Vec<Arc<dyn ActionHandler>>>,
}

impl TeardownChain {
    fn push(&self, handler: Arc<dyn ActionHandler>) {
        self.handlers.write().push(handler);
    }

    fn snapshot(&self) -> Vec<Arc<dyn ActionHandler>> {
        self.handlers.read().clone()
    }
}

/// Composite handler installed under the close sentinel: runs every teardown
/// handler in registration order, ignoring individual failures.
struct TeardownHandler {
    chain: Arc<TeardownChain>,
}

#[async_trait]
impl ActionHandler for TeardownHandler {
    async fn handle(&self, request: HandlerRequest) -> anyhow::Result<ActionReply> {
        let action = request.action.clone();
        for (index, handler) in self.chain.snapshot().iter().enumerate() {
            if let Err(err) = handler.handle(request.clone()).await {
                warn!(action = %action, index, error = %err, "teardown handler failed");
            }
        }
        Ok(ActionReply::new(action))
    }
}

/// Concurrent mapping from action ID to registration entry.
///
/// Safe under arbitrary concurrent readers and writers: registration normally
/// happens during startup, but a late registration never races unsafely with
/// in-flight lookups.
#[derive(Default)]
pub struct ActionTable {
    entries: DashMap<ActionId, ActionEntry>,
    teardown: Arc<TeardownChain>,
}

impl ActionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an action.
    ///
    /// A second registration under the same non-close ID is a wiring bug:
    /// silent overwrite would misroute production traffic, so this panics.
    /// Registrations under the close sentinel chain instead — every handler
    /// registered there runs, in order, on a single close dispatch.
    ///
    /// # Panics
    ///
    /// If the ID already has a handler and is not the close sentinel.
    pub fn register(
        &self,
        action: Action,
        structure: Option<StructureFactory>,
        handler: Arc<dyn ActionHandler>,
    ) {
        if action.id.is_close() {
            self.teardown.push(handler);
            let chain = Arc::clone(&self.teardown);
            let _ = self.entries.entry(action.id).or_insert_with(move || ActionEntry {
                action,
                structure,
                handler: Arc::new(TeardownHandler { chain }),
            });
            return;
        }
        match self.entries.entry(action.id) {
            Entry::Occupied(existing) => {
                panic!(
                    "duplicate handler registration for action {} (already registered as {})",
                    action,
                    existing.get().action
                );
            }
            Entry::Vacant(slot) => {
                let _ = slot.insert(ActionEntry {
                    action,
                    structure,
                    handler,
                });
            }
        }
    }

    /// Point lookup. `None` signals an unknown action.
    #[must_use]
    pub fn get(&self, id: ActionId) -> Option<ActionEntry> {
        self.entries.get(&id).map(|entry| entry.clone())
    }

    /// Whether an action is registered.
    #[must_use]
    pub fn contains(&self, id: ActionId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of registered actions (the close sentinel counts once).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no actions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Visit every registered action, in no guaranteed order.
    ///
    /// Stops at the first visitor error and propagates it.
    pub fn range_actions<E>(
        &self,
        mut visit: impl FnMut(&Action) -> Result<(), E>,
    ) -> Result<(), E> {
        for entry in self.entries.iter() {
            visit(&entry.action)?;
        }
        Ok(())
    }

    /// All registered actions, collected via [`range_actions`](Self::range_actions).
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(self.entries.len());
        let _ = self.range_actions(|action| {
            actions.push(action.clone());
            Ok::<(), std::convert::Infallible>(())
        });
        actions
    }
}

/// Lazily creates one [`ActionTable`] per channel.
///
/// A channel partitions the action-ID space (one namespace per business
/// line). Channels are never retired during the process lifetime; concurrent
/// first access to a new channel creates exactly one table.
#[derive(Default)]
pub struct TableProvider {
    tables: DashMap<String, Arc<ActionTable>>,
}

impl TableProvider {
    /// Create a provider with no channels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The table for a channel, created on first access.
    #[must_use]
    pub fn table(&self, channel: &str) -> Arc<ActionTable> {
        if let Some(existing) = self.tables.get(channel) {
            return Arc::clone(&existing);
        }
        Arc::clone(
            self.tables
                .entry(channel.to_owned())
                .or_insert_with(|| Arc::new(ActionTable::new()))
                .value(),
        )
    }

    /// Channel names with a table, sorted.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
