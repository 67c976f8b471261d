//! Key-value store port and its in-memory implementation

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fmt;

/// String key-value persistence
///
/// No TTL and no namespacing beyond caller-chosen key prefixes.
pub trait StateStore: Send + Sync + fmt::Debug {
    /// Value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: String);

    /// Remove `key` if present
    fn remove(&self, key: &str);
}

/// In-memory store backed by a concurrent map
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: BTreeMap<String, String>) -> Self {
        Self {
            entries: snapshot.into_iter().collect(),
        }
    }

    /// Copy of all entries, ordered by key
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Keys starting with `prefix`, sorted
    #[must_use]
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|value| value.clone())
    }

    fn set(&self, key: &str, value: String) {
        tracing::trace!(key, value = %value, "store set");
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        tracing::trace!(key, "store remove");
        self.entries.remove(key);
    }
}
