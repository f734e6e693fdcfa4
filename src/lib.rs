// SPDX-License-Identifier: MIT

//! learner-kit: learner profiles and engagement analytics for the mobile
//! learning apps.
//!
//! This crate keeps a locally-persisted learner record (identity + property
//! bag) reconciled against a remote copy, and an append-only activity ledger
//! with deduplicated, batched, at-least-once upload. All local operations
//! succeed synchronously; remote sync is asynchronous and best-effort.
//!
//! The app shell constructs one [`LearnerKit`] at startup, hands it the
//! key-value store of its platform, and owns it from a single task:
//!
//! ```no_run
//! use std::sync::Arc;
//! use learner_kit::config::Config;
//! use learner_kit::storage::FileStore;
//! use learner_kit::LearnerKit;
//!
//! # async fn start() -> anyhow::Result<()> {
//! let storage = Arc::new(FileStore::open("learner.json")?);
//! let mut kit = LearnerKit::new(Config::from_env()?, storage);
//!
//! kit.kickstart(None, &["language"]);
//! kit.increment_launch_count();
//! kit.reconcile().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use services::{ActivityService, ApiClient, LearnerService};
use storage::KeyValueStore;
use uuid::Uuid;

/// The personalization core: config, storage, and both services, explicitly
/// constructed and dependency-injected (no global singletons).
pub struct LearnerKit {
    pub config: Arc<Config>,
    pub storage: Arc<dyn KeyValueStore>,
    pub learner: LearnerService,
    pub activities: ActivityService,
}

impl LearnerKit {
    pub fn new(config: Config, storage: Arc<dyn KeyValueStore>) -> Self {
        let config = Arc::new(config);
        let client = ApiClient::new(&config);
        Self {
            learner: LearnerService::new(config.clone(), storage.clone(), client.clone()),
            activities: ActivityService::new(config.clone(), storage.clone(), client),
            config,
            storage,
        }
    }

    /// Restore (or create) the learner record and load the activity ledger.
    /// Call once at app start, before anything else.
    pub fn kickstart(&mut self, predefined_id: Option<Uuid>, seed_property_keys: &[&str]) {
        self.learner.kickstart(predefined_id, seed_property_keys);
        self.activities.kickstart();
    }

    /// Session-start remote reconciliation of the learner record.
    pub async fn reconcile(&mut self) {
        self.learner.reconcile().await;
    }

    /// Opportunistic batched upload of unsynced ledger entries, using the
    /// configured default minimum batch size.
    pub fn sync_activities(&self) {
        self.activities.spawn_bulk_upload(self.config.min_batch_size);
    }

    /// Apply results reported by background remote tasks. Call periodically
    /// from the owning task (e.g. on app foreground).
    pub fn pump(&mut self) {
        self.learner.pump_events();
        self.activities.pump_acks();
    }
}
