// SPDX-License-Identifier: MIT

//! Local learner manager and remote merge resolver.
//!
//! `LearnerService` is the single source of truth for the current learner:
//! all reads and writes go through it, and it is owned by exactly one task.
//! Local mutation and persistence are synchronous; remote pushes run as
//! spawned tasks that report back over a channel, drained by
//! [`LearnerService::pump_events`]; background jobs never touch the
//! service's state directly.

use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{LearnerRecord, PropertyValue};
use crate::services::ApiClient;
use crate::storage::{keys, KeyValueStore, StoredValue};

/// Results reported by fire-and-forget remote tasks.
enum LearnerEvent {
    /// A background update succeeded; the echoed record is the new remote copy.
    Pushed(LearnerRecord),
}

/// Owns the current learner record and its synchronization state.
pub struct LearnerService {
    config: Arc<Config>,
    storage: Arc<dyn KeyValueStore>,
    client: ApiClient,
    record: Option<LearnerRecord>,
    /// Last known remote copy. `Some` gates background pushes: we only
    /// update a record the server is known to have.
    remote: Option<LearnerRecord>,
    last_update_attempt: Option<Instant>,
    events_tx: mpsc::UnboundedSender<LearnerEvent>,
    events_rx: mpsc::UnboundedReceiver<LearnerEvent>,
    changes_tx: watch::Sender<Option<LearnerRecord>>,
}

impl LearnerService {
    pub fn new(config: Arc<Config>, storage: Arc<dyn KeyValueStore>, client: ApiClient) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (changes_tx, _) = watch::channel(None);
        Self {
            config,
            storage,
            client,
            record: None,
            remote: None,
            last_update_attempt: None,
            events_tx,
            events_rx,
            changes_tx,
        }
    }

    // ─── Local Record ────────────────────────────────────────────

    /// Restore or create the local learner record. Idempotent; always leaves
    /// a record in place and persisted.
    ///
    /// `predefined_id` migrates a previously-assigned analytics id onto the
    /// record (restored or fresh). On first launch the configured build
    /// version is recorded (storage key + property) and any `seed_keys`
    /// found as text in storage are copied into the property bag.
    pub fn kickstart(&mut self, predefined_id: Option<Uuid>, seed_keys: &[&str]) {
        if self.record.is_some() {
            return;
        }

        let store = self.storage.as_ref();
        let record = match store.get_json::<LearnerRecord>(keys::CURRENT_LEARNER) {
            Some(mut restored) => {
                if let Some(id) = predefined_id {
                    restored.id = id;
                }
                restored
            }
            None => {
                let mut fresh = LearnerRecord::new(predefined_id.unwrap_or_else(Uuid::new_v4));
                if let Some(build) = &self.config.build_version {
                    self.storage.store(
                        keys::BUNDLE_VERSION_AT_INSTALL,
                        StoredValue::Text(build.clone()),
                    );
                    fresh.set_property(keys::BUNDLE_VERSION_AT_INSTALL, build.as_str());
                }
                for key in seed_keys {
                    if let Some(value) = store.get_text(key) {
                        fresh.set_property(key, value);
                    }
                }
                tracing::info!(id = %fresh.id, "created local learner");
                fresh
            }
        };

        self.record = Some(record);
        self.persist();
    }

    pub fn record(&self) -> Option<&LearnerRecord> {
        self.record.as_ref()
    }

    pub fn learner_id(&self) -> Option<Uuid> {
        self.record.as_ref().map(|r| r.id)
    }

    /// Pure read from the in-memory record.
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.record.as_ref().and_then(|r| r.get_property(key))
    }

    /// Set a property and persist. Empty keys or empty text values are
    /// rejected inside the record (logged, nothing persisted).
    pub fn set_property(&mut self, key: &str, value: impl Into<PropertyValue>) {
        let Some(record) = self.record.as_mut() else {
            tracing::warn!(key, "set_property before kickstart; dropped");
            return;
        };
        if record.set_property(key, value) {
            self.persist();
        }
    }

    /// Observers (UI refresh) get a snapshot whenever the record changes.
    pub fn watch(&self) -> watch::Receiver<Option<LearnerRecord>> {
        self.changes_tx.subscribe()
    }

    /// Serialize the current record to storage, then opportunistically push
    /// it to the remote store. The local write is synchronous and happens
    /// even when the remote push is skipped or fails.
    fn persist(&mut self) {
        let Some(record) = &self.record else { return };

        self.storage.as_ref().store_json(keys::CURRENT_LEARNER, record);
        self.changes_tx.send_replace(Some(record.clone()));
        self.maybe_push_remote();
    }

    // ─── Remote Push (fire-and-forget) ───────────────────────────

    /// Spawn a remote update if the remote record exists and the cooldown
    /// has elapsed. Never blocks and never fails the caller.
    fn maybe_push_remote(&mut self) {
        if self.remote.is_none() {
            return;
        }
        // Check for a runtime before registering the attempt, so a skipped
        // push does not start the cooldown clock.
        let Ok(handle) = Handle::try_current() else {
            tracing::debug!("no async runtime; skipping remote learner push");
            return;
        };
        if !self.register_update_attempt(Instant::now()) {
            return;
        }
        let Some(record) = self.record.clone() else { return };

        let client = self.client.clone();
        let events = self.events_tx.clone();
        handle.spawn(async move {
            match client.update_learner(&record).await {
                Ok(updated) => {
                    let _ = events.send(LearnerEvent::Pushed(updated));
                }
                Err(error) => {
                    tracing::warn!(%error, "remote learner update failed");
                }
            }
        });
    }

    /// Record an update attempt at `now` unless one happened within the
    /// cooldown window. Returns whether the attempt may proceed.
    fn register_update_attempt(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_update_attempt {
            if now.duration_since(last) < self.config.update_cooldown {
                return false;
            }
        }
        self.last_update_attempt = Some(now);
        true
    }

    /// Apply results reported by background tasks. Call from the owning
    /// task, e.g. once per UI tick or app-foreground event.
    pub fn pump_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                LearnerEvent::Pushed(updated) => {
                    tracing::debug!(id = %updated.id, "remote learner updated");
                    self.remote = Some(updated);
                }
            }
        }
    }

    // ─── Session-start Reconciliation ────────────────────────────

    /// Reconcile local and remote learner state; run once per session.
    ///
    /// Fetches the remote record (creating it if missing), merges it under
    /// the local record with override flags, pushes the merge back only when
    /// it differs from the fetched copy, persists the result, and signals
    /// observers. Every failure path degrades to local-only and logs.
    pub async fn reconcile(&mut self) {
        let Some(local) = self.record.clone() else {
            tracing::warn!("reconcile before kickstart; skipped");
            return;
        };

        let fetched = match self.client.get_learner(local.id).await {
            Ok(remote) => remote,
            Err(fetch_error) => {
                tracing::info!(%fetch_error, "remote learner not fetched, creating");
                match self.client.create_learner(&local).await {
                    Ok(created) => created,
                    Err(create_error) => {
                        tracing::warn!(%create_error, "remote learner creation failed");
                        return;
                    }
                }
            }
        };
        self.remote = Some(fetched.clone());

        let merged = local.merged_with_remote(&fetched);
        let adopted = if merged != fetched {
            match self.client.update_learner(&merged).await {
                Ok(updated) => {
                    self.remote = Some(updated.clone());
                    updated
                }
                Err(update_error) => {
                    // Keep the merge locally; the cooldown path retries later.
                    tracing::warn!(%update_error, "merged learner push failed");
                    merged
                }
            }
        } else {
            fetched
        };

        self.record = Some(adopted);
        let record = self.record.clone();
        self.storage
            .as_ref()
            .store_json(keys::CURRENT_LEARNER, record.as_ref().unwrap());
        self.changes_tx.send_replace(record);
    }
}
