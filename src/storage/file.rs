// SPDX-License-Identifier: MIT

//! JSON-file key-value store.
//!
//! The whole map is kept in memory and rewritten to disk on every mutation.
//! That is O(n) per write, which is fine at the scale of one learner profile
//! and a few thousand ledger entries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;

use super::{KeyValueStore, StoredValue};

/// Durable store backed by a single JSON file.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, StoredValue>>,
}

impl FileStore {
    /// Open a store at `path`, loading any existing snapshot.
    ///
    /// A missing file starts empty; an unreadable or corrupt file is an
    /// error so callers can decide whether to wipe it.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read store file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("corrupt store file {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, StoredValue>) {
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(error) => {
                tracing::warn!(%error, "failed to encode store snapshot");
                return;
            }
        };
        if let Err(error) = std::fs::write(&self.path, json) {
            tracing::warn!(path = %self.path.display(), %error, "failed to write store file");
        }
    }
}

impl KeyValueStore for FileStore {
    fn store(&self, key: &str, value: StoredValue) {
        let mut entries = self.entries.lock().expect("store poisoned");
        entries.insert(key.to_string(), value);
        self.flush(&entries);
    }

    fn retrieve(&self, key: &str) -> Option<StoredValue> {
        self.entries
            .lock()
            .expect("store poisoned")
            .get(key)
            .cloned()
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().expect("store poisoned");
        if entries.remove(key).is_some() {
            self.flush(&entries);
        }
    }

    fn list_keys(&self, prefix: &str) -> Vec<String> {
        self.entries
            .lock()
            .expect("store poisoned")
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }
}
