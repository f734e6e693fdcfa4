// SPDX-License-Identifier: MIT

//! Key-value persistence layer.
//!
//! The app shell decides where learner state actually lives (UserDefaults,
//! SharedPreferences, a file next to the app bundle, ...); the services only
//! see the `KeyValueStore` trait. Two implementations ship with the crate:
//! [`MemoryStore`] for tests and [`FileStore`] for a simple durable install.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Well-known storage keys.
pub mod keys {
    /// Serialized `LearnerRecord` (JSON).
    pub const CURRENT_LEARNER: &str = "current_learner";
    /// Serialized activity ledger (JSON array, full collection).
    pub const ACTIVITY_HISTORY: &str = "engagement_history";
    /// Launch counter.
    pub const LAUNCH_COUNT: &str = "launch_count";
    /// Launch counter under its pre-rename key.
    pub const LEGACY_LAUNCH_COUNT: &str = "appOpenedCount";
    /// Build version recorded at install time.
    pub const BUNDLE_VERSION_AT_INSTALL: &str = "bundleVersionAtInstall";
}

/// A value as stored: the backing stores are schemaless, so everything is
/// one of these tags.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StoredValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Bytes(Vec<u8>),
}

/// Generic persistent key-value mapping, atomic per key, surviving process
/// restarts. No cross-key transactions.
///
/// Writes are infallible from the caller's perspective; implementations log
/// I/O problems and keep going (in-memory state stays authoritative for the
/// rest of the session).
pub trait KeyValueStore: Send + Sync {
    fn store(&self, key: &str, value: StoredValue);
    fn retrieve(&self, key: &str) -> Option<StoredValue>;
    fn remove(&self, key: &str);
    fn list_keys(&self, prefix: &str) -> Vec<String>;
}

impl dyn KeyValueStore {
    /// Read a text value, ignoring other tags.
    pub fn get_text(&self, key: &str) -> Option<String> {
        match self.retrieve(key) {
            Some(StoredValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Read an integer value, ignoring other tags.
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        match self.retrieve(key) {
            Some(StoredValue::Integer(n)) => Some(n),
            _ => None,
        }
    }

    /// Read a boolean value, defaulting to `false`.
    pub fn get_flag(&self, key: &str) -> bool {
        matches!(self.retrieve(key), Some(StoredValue::Boolean(true)))
    }

    /// Serialize a value as JSON text under `key`. Encoding failures are
    /// logged and the write is skipped.
    pub fn store_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.store(key, StoredValue::Text(json)),
            Err(error) => {
                tracing::warn!(key, %error, "failed to encode value for storage");
            }
        }
    }

    /// Read and decode a JSON text value. Decode failures are logged and
    /// reported as absence.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = self.get_text(key)?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(key, %error, "failed to decode stored value");
                None
            }
        }
    }
}
