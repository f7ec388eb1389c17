//! Bound identities: external IDs associated with live gateway connections.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single external identity binding: a typed external ID.
///
/// `kind` discriminates the ID space (e.g. `"user"`, `"device"`); `id` is the
/// external identifier within that space.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundIdentity {
    /// Identity type discriminator.
    pub kind: String,
    /// External identifier within the type's ID space.
    pub id: String,
}

impl BoundIdentity {
    /// Create a binding from a kind and an ID.
    #[must_use]
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// The decoded set of identity bindings carried on a dispatch: type → external ID.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundIdentitySet(HashMap<String, String>);

impl BoundIdentitySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the external ID bound under a type.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&str> {
        self.0.get(kind).map(String::as_str)
    }

    /// Insert a binding, returning the previous ID for the type if any.
    pub fn insert(&mut self, identity: BoundIdentity) -> Option<String> {
        self.0.insert(identity.kind, identity.id)
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over (type, external ID) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<HashMap<String, String>> for BoundIdentitySet {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl FromIterator<BoundIdentity> for BoundIdentitySet {
    fn from_iter<I: IntoIterator<Item = BoundIdentity>>(iter: I) -> Self {
        let mut set = Self::new();
        for identity in iter {
            let _ = set.insert(identity);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut set = BoundIdentitySet::new();
        assert!(set.insert(BoundIdentity::new("user", "u-1")).is_none());
        assert_eq!(set.get("user"), Some("u-1"));
        assert!(set.get("device").is_none());
    }

    #[test]
    fn insert_replaces_same_kind() {
        let mut set = BoundIdentitySet::new();
        let _ = set.insert(BoundIdentity::new("user", "u-1"));
        let prev = set.insert(BoundIdentity::new("user", "u-2"));
        assert_eq!(prev.as_deref(), Some("u-1"));
        assert_eq!(set.get("user"), Some("u-2"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn from_iterator() {
        let set: BoundIdentitySet = [
            BoundIdentity::new("user", "u-1"),
            BoundIdentity::new("device", "d-9"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("device"), Some("d-9"));
    }

    #[test]
    fn serde_is_a_plain_map() {
        let mut set = BoundIdentitySet::new();
        let _ = set.insert(BoundIdentity::new("user", "u-1"));
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"user":"u-1"}"#);
        let back: BoundIdentitySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
