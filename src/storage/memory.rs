// SPDX-License-Identifier: MIT

//! In-memory key-value store.

use dashmap::DashMap;

use super::{KeyValueStore, StoredValue};

/// Non-durable store for tests and offline use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn store(&self, key: &str, value: StoredValue) {
        self.entries.insert(key.to_string(), value);
    }

    fn retrieve(&self, key: &str) -> Option<StoredValue> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    fn list_keys(&self, prefix: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect()
    }
}
