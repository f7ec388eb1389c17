//! Action identifiers and metadata.
//!
//! An action is a numbered, named unit of request/response behavior. The
//! numeric identifier is the routing key; the name is for humans and for
//! registry publication. Two actions are equal iff their identifiers are
//! equal — the name never participates in equality or hashing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric action identifier, unique within a channel's action table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(u32);

/// The designated close sentinel.
///
/// Registrations under this identifier are teardown handlers: they chain
/// instead of conflicting, and all run on a single close dispatch.
pub const CLOSE_ACTION_ID: ActionId = ActionId(0);

impl ActionId {
    /// Create an action ID from its numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Whether this is the close sentinel.
    #[must_use]
    pub const fn is_close(self) -> bool {
        self.0 == CLOSE_ACTION_ID.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ActionId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Action metadata: identifier plus human-readable name.
///
/// Immutable once registered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Action {
    /// Routing identifier, unique within a channel.
    pub id: ActionId,
    /// Human-readable name, published to the registry.
    pub name: String,
}

impl Action {
    /// Create an action from a numeric ID and a name.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: ActionId::new(id),
            name: name.into(),
        }
    }

    /// The close-sentinel action.
    #[must_use]
    pub fn close() -> Self {
        Self::new(CLOSE_ACTION_ID.value(), "close")
    }

    /// Whether this is the close sentinel.
    #[must_use]
    pub fn is_close(&self) -> bool {
        self.id.is_close()
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Action {}

impl std::hash::Hash for Action {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}

/// Opaque descriptor of a live connection on a gateway.
///
/// File-descriptor-like: meaningful only to the gateway that issued it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnDescriptor(i64);

impl ConnDescriptor {
    /// Wrap a raw descriptor value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// The raw descriptor value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ConnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ConnDescriptor {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
