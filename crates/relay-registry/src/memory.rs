//! In-process registry for tests and local development.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::errors::RegistryError;
use crate::registry::{Registry, WatchCallback, WatchEvent, WatchEventKind};

struct Subscriber {
    prefix: String,
    callback: WatchCallback,
}

/// [`Registry`] backed by an in-process map.
///
/// Notifications are delivered synchronously from the mutating call. TTLs are
/// accepted but never expire — single-process lifetimes don't need leases.
/// Failure injection toggles make partial-failure paths testable.
#[derive(Default)]
pub struct MemoryRegistry {
    entries: RwLock<BTreeMap<String, String>>,
    subscribers: RwLock<Vec<Subscriber>>,
    fail_register: AtomicBool,
    fail_unregister: AtomicBool,
    fail_watch: AtomicBool,
}

impl MemoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The value currently registered under a key.
    #[must_use]
    pub fn value_of(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no keys are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Make the next `register` call fail.
    pub fn fail_next_register(&self) {
        self.fail_register.store(true, Ordering::SeqCst);
    }

    /// Make the next `unregister` call fail.
    pub fn fail_next_unregister(&self) {
        self.fail_unregister.store(true, Ordering::SeqCst);
    }

    /// Make the next `watch` call fail.
    pub fn fail_next_watch(&self) {
        self.fail_watch.store(true, Ordering::SeqCst);
    }

    fn notify(&self, key: &str, value: &str, kind: WatchEventKind) {
        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            if key.starts_with(&subscriber.prefix) {
                (subscriber.callback)(WatchEvent {
                    key: key.to_owned(),
                    value: value.to_owned(),
                    kind,
                });
            }
        }
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn register(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), RegistryError> {
        if self.fail_register.swap(false, Ordering::SeqCst) {
            return Err(RegistryError::operation("register", key, "injected failure"));
        }
        let _ = self.entries.write().insert(key.to_owned(), value.to_owned());
        self.notify(key, value, WatchEventKind::Put);
        Ok(())
    }

    async fn unregister(&self, key: &str) -> Result<(), RegistryError> {
        if self.fail_unregister.swap(false, Ordering::SeqCst) {
            return Err(RegistryError::operation("unregister", key, "injected failure"));
        }
        let removed = self.entries.write().remove(key);
        if removed.is_some() {
            self.notify(key, "", WatchEventKind::Delete);
        }
        Ok(())
    }

    async fn watch(&self, prefix: &str, on_event: WatchCallback) -> Result<(), RegistryError> {
        if self.fail_watch.swap(false, Ordering::SeqCst) {
            return Err(RegistryError::subscribe(prefix, "injected failure"));
        }
        // Replay keys already present under the prefix as initial puts.
        let existing: Vec<(String, String)> = {
            let entries = self.entries.read();
            entries
                .range(prefix.to_owned()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        for (key, value) in existing {
            on_event(WatchEvent {
                key,
                value,
                kind: WatchEventKind::Put,
            });
        }
        self.subscribers.write().push(Subscriber {
            prefix: prefix.to_owned(),
            callback: on_event,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn register_and_lookup() {
        let registry = MemoryRegistry::new();
        registry.register("a/b", "v", Duration::from_secs(1)).await.unwrap();
        assert_eq!(registry.value_of("a/b"), Some("v".into()));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unregister_removes() {
        let registry = MemoryRegistry::new();
        registry.register("a/b", "v", Duration::from_secs(1)).await.unwrap();
        registry.unregister("a/b").await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn watch_sees_puts_and_deletes_under_prefix() {
        let registry = MemoryRegistry::new();
        let seen = Arc::new(RwLock::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry
            .watch(
                "roles/",
                Arc::new(move |event: WatchEvent| {
                    sink.write().push((event.key, event.kind));
                }),
            )
            .await
            .unwrap();

        registry.register("roles/x", "1", Duration::from_secs(1)).await.unwrap();
        registry.register("other/y", "1", Duration::from_secs(1)).await.unwrap();
        registry.unregister("roles/x").await.unwrap();

        let seen = seen.read();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("roles/x".into(), WatchEventKind::Put));
        assert_eq!(seen[1], ("roles/x".into(), WatchEventKind::Delete));
    }

    #[tokio::test]
    async fn watch_replays_existing_keys() {
        let registry = MemoryRegistry::new();
        registry.register("roles/a", "1", Duration::from_secs(1)).await.unwrap();
        registry.register("roles/b", "2", Duration::from_secs(1)).await.unwrap();
        registry.register("zzz/c", "3", Duration::from_secs(1)).await.unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&count);
        registry
            .watch(
                "roles/",
                Arc::new(move |_| {
                    let _ = sink.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unregister_of_absent_key_emits_nothing() {
        let registry = MemoryRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&count);
        registry
            .watch(
                "",
                Arc::new(move |_| {
                    let _ = sink.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await
            .unwrap();
        registry.unregister("nope").await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn injected_failures_fire_once() {
        let registry = MemoryRegistry::new();
        registry.fail_next_register();
        assert!(registry.register("k", "v", Duration::from_secs(1)).await.is_err());
        assert!(registry.register("k", "v", Duration::from_secs(1)).await.is_ok());

        registry.fail_next_watch();
        assert!(registry.watch("p/", Arc::new(|_| {})).await.is_err());
        assert!(registry.watch("p/", Arc::new(|_| {})).await.is_ok());
    }
}
