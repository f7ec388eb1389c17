//! The live set of gateway hosts for one role.

use parking_lot::RwLock;

/// Set of known gateway host endpoints, in arrival order.
///
/// Written only by the role's membership watcher; read concurrently by any
/// number of in-flight gateway operations. Readers take an atomic
/// [`snapshot`](HostSet::snapshot) — a fan-out loop never observes a
/// partially-updated set. Membership is eventually consistent with the
/// registry, modulo in-flight notification latency.
#[derive(Debug, Default)]
pub struct HostSet {
    hosts: RwLock<Vec<String>>,
}

impl HostSet {
    /// Create an empty host set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a host. Idempotent: re-adding an existing host is a no-op.
    ///
    /// Returns `true` if the host was newly added.
    pub fn add(&self, host: &str) -> bool {
        let mut hosts = self.hosts.write();
        if hosts.iter().any(|h| h == host) {
            return false;
        }
        hosts.push(host.to_owned());
        true
    }

    /// Remove a host. Idempotent: removing an absent host is a no-op.
    ///
    /// Returns `true` if the host was present.
    pub fn remove(&self, host: &str) -> bool {
        let mut hosts = self.hosts.write();
        let before = hosts.len();
        hosts.retain(|h| h != host);
        hosts.len() < before
    }

    /// Whether a host is currently known.
    #[must_use]
    pub fn contains(&self, host: &str) -> bool {
        self.hosts.read().iter().any(|h| h == host)
    }

    /// An atomic copy of the current membership, in arrival order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.hosts.read().clone()
    }

    /// Number of known hosts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.read().len()
    }

    /// Whether no hosts are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let set = HostSet::new();
        assert!(set.add("h1"));
        assert!(!set.add("h1"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let set = HostSet::new();
        let _ = set.add("h1");
        assert!(set.remove("h1"));
        assert!(!set.remove("h1"));
        assert!(set.is_empty());
    }

    #[test]
    fn snapshot_preserves_arrival_order() {
        let set = HostSet::new();
        let _ = set.add("h2");
        let _ = set.add("h1");
        let _ = set.add("h3");
        assert_eq!(set.snapshot(), vec!["h2", "h1", "h3"]);
    }

    #[test]
    fn snapshot_is_detached_from_later_mutation() {
        let set = HostSet::new();
        let _ = set.add("h1");
        let snap = set.snapshot();
        let _ = set.remove("h1");
        assert_eq!(snap, vec!["h1"]);
        assert!(set.is_empty());
    }

    #[test]
    fn concurrent_readers_and_writer() {
        let set = std::sync::Arc::new(HostSet::new());
        std::thread::scope(|scope| {
            let writer = std::sync::Arc::clone(&set);
            let _ = scope.spawn(move || {
                for i in 0..100 {
                    let _ = writer.add(&format!("h{i}"));
                    if i % 3 == 0 {
                        let _ = writer.remove(&format!("h{i}"));
                    }
                }
            });
            for _ in 0..4 {
                let reader = std::sync::Arc::clone(&set);
                let _ = scope.spawn(move || {
                    for _ in 0..100 {
                        // A snapshot is always internally consistent.
                        let snap = reader.snapshot();
                        assert!(snap.len() <= 100);
                    }
                });
            }
        });
    }
}
