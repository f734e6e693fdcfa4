// SPDX-License-Identifier: MIT

//! Activity ledger and sync engine.
//!
//! The ledger is the durable system of record for "has this event happened
//! and was it reported": an append-only, deduplicated log persisted as one
//! serialized collection, with a per-entry boolean sync marker alongside it.
//! Two upload paths feed the remote store:
//! - a fire-and-forget single-entry upload at append time, and
//! - the batched `sync_batch` engine, which catches anything the single
//!   path missed (crashes, offline periods).
//!
//! Both paths are at-least-once; the remote store dedups by entry id.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::models::{ActivityLogEntry, ActivityValue, Assessment};
use crate::services::ApiClient;
use crate::storage::{keys, KeyValueStore, StoredValue};

/// How to pick one entry when a query matches several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuePolicy {
    First,
    Last,
    /// Highest numeric value (decimal parse, unparsable counts as zero).
    Max,
    /// Lowest numeric value.
    Min,
}

/// Owns the in-memory ledger and its synchronization state.
pub struct ActivityService {
    config: Arc<Config>,
    storage: Arc<dyn KeyValueStore>,
    client: ApiClient,
    history: Vec<ActivityLogEntry>,
    acks_tx: mpsc::UnboundedSender<Vec<Uuid>>,
    acks_rx: mpsc::UnboundedReceiver<Vec<Uuid>>,
}

impl ActivityService {
    pub fn new(config: Arc<Config>, storage: Arc<dyn KeyValueStore>, client: ApiClient) -> Self {
        let (acks_tx, acks_rx) = mpsc::unbounded_channel();
        Self {
            config,
            storage,
            client,
            history: Vec::new(),
            acks_tx,
            acks_rx,
        }
    }

    // ─── Ledger ──────────────────────────────────────────────────

    /// Load the persisted ledger. Absence or a decode failure starts an
    /// empty ledger; this never fails the caller.
    pub fn kickstart(&mut self) {
        match self.storage.as_ref().get_json::<Vec<ActivityLogEntry>>(keys::ACTIVITY_HISTORY) {
            Some(history) => {
                tracing::debug!(entries = history.len(), "loaded activity history");
                self.history = history;
            }
            None => {
                tracing::info!("no usable activity history, starting empty");
                self.history = Vec::new();
            }
        }
    }

    pub fn history(&self) -> &[ActivityLogEntry] {
        &self.history
    }

    /// Append an entry. An id already in the ledger is a no-op (idempotent).
    ///
    /// The full collection is rewritten to storage synchronously; a single
    /// fire-and-forget upload is then attempted, and its acknowledgment
    /// marks the entry synced via the ack channel.
    pub fn append(&mut self, entry: ActivityLogEntry) {
        if self.history.iter().any(|existing| existing.id == entry.id) {
            tracing::debug!(id = %entry.id, "duplicate ledger entry ignored");
            return;
        }

        self.history.push(entry.clone());
        self.persist_history();
        self.spawn_single_upload(entry);
    }

    fn persist_history(&self) {
        self.storage
            .as_ref()
            .store_json(keys::ACTIVITY_HISTORY, &self.history);
    }

    fn spawn_single_upload(&self, entry: ActivityLogEntry) {
        let Ok(handle) = Handle::try_current() else {
            tracing::debug!("no async runtime; skipping single upload");
            return;
        };
        let client = self.client.clone();
        let acks = self.acks_tx.clone();
        handle.spawn(async move {
            match client.log_activity(&entry).await {
                Ok(accepted) => {
                    let _ = acks.send(vec![accepted.id]);
                }
                Err(error) => {
                    tracing::warn!(id = %entry.id, %error, "single activity upload failed");
                }
            }
        });
    }

    // ─── Queries ─────────────────────────────────────────────────

    /// All entries matching the provided filters (AND semantics; omitted
    /// filters match everything).
    pub fn query(
        &self,
        activity_id: Option<&str>,
        kind: Option<&str>,
        value: Option<&str>,
    ) -> Vec<&ActivityLogEntry> {
        self.history
            .iter()
            .filter(|entry| activity_id.is_none_or(|id| entry.activity_id == id))
            .filter(|entry| kind.is_none_or(|k| entry.kind == k))
            .filter(|entry| {
                value.is_none_or(|v| entry.value.as_ref().is_some_and(|ev| ev.as_str() == v))
            })
            .collect()
    }

    /// One matching entry, picked by `policy` when several match.
    pub fn select(
        &self,
        activity_id: &str,
        kind: Option<&str>,
        value: Option<&str>,
        policy: ValuePolicy,
    ) -> Option<&ActivityLogEntry> {
        let matches = self.query(Some(activity_id), kind, value);

        fn numeric(entry: &ActivityLogEntry) -> Decimal {
            entry
                .value
                .as_ref()
                .map(ActivityValue::as_decimal)
                .unwrap_or_default()
        }

        match policy {
            ValuePolicy::First => matches.first().copied(),
            ValuePolicy::Last => matches.last().copied(),
            ValuePolicy::Max => matches.iter().copied().max_by_key(|entry| numeric(entry)),
            ValuePolicy::Min => matches.iter().copied().min_by_key(|entry| numeric(entry)),
        }
    }

    /// All entries of any of the given kinds.
    pub fn activities_of_kinds(&self, kinds: &[&str]) -> Vec<&ActivityLogEntry> {
        self.history
            .iter()
            .filter(|entry| kinds.contains(&entry.kind.as_str()))
            .collect()
    }

    // ─── Sync Markers ────────────────────────────────────────────

    pub fn is_synced(&self, id: Uuid) -> bool {
        self.storage.as_ref().get_flag(&id.to_string())
    }

    /// Flag entries as acknowledged by the remote store.
    pub fn mark_synced(&self, ids: &[Uuid]) {
        for id in ids {
            self.storage
                .store(&id.to_string(), StoredValue::Boolean(true));
        }
    }

    /// Apply acknowledgments reported by background uploads. Call from the
    /// owning task.
    pub fn pump_acks(&mut self) {
        while let Ok(ids) = self.acks_rx.try_recv() {
            self.mark_synced(&ids);
        }
    }

    // ─── Sync Engine ─────────────────────────────────────────────

    /// Unsynced entries in upload order: sorted by start date ascending
    /// (entries without a parsable date sort as "now", i.e. last), capped at
    /// `limit`. Entries beyond the cap wait for a future cycle.
    pub fn unsynced_batch(&self, limit: usize) -> Vec<ActivityLogEntry> {
        let now = Utc::now();
        let mut ordered: Vec<&ActivityLogEntry> = self.history.iter().collect();
        ordered.sort_by_key(|entry| entry.start_date().unwrap_or(now));

        ordered
            .into_iter()
            .filter(|entry| !self.is_synced(entry.id))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Upload one batch of unsynced entries.
    ///
    /// Below `min_count` candidates, aborts with `MissingInput` before any
    /// network activity. The batch succeeds or fails as a whole: on failure
    /// no markers change and the next cycle retries the same candidates; on
    /// success exactly the server-acknowledged ids are marked.
    pub async fn sync_batch(&mut self, min_count: usize) -> Result<Vec<Uuid>> {
        let candidates = self.unsynced_batch(self.config.max_batch_size);
        if candidates.len() < min_count {
            // Too few new entries, no need to upload yet.
            return Err(ServiceError::MissingInput);
        }

        let accepted = self.client.bulk_log_activities(&candidates).await?;
        let ids: Vec<Uuid> = accepted.iter().map(|entry| entry.id).collect();
        self.mark_synced(&ids);

        tracing::info!(uploaded = ids.len(), "activity batch synced");
        Ok(ids)
    }

    /// Opportunistic fire-and-forget batch upload (e.g. on app foreground).
    /// Failures are logged and swallowed; acknowledgments come back through
    /// [`ActivityService::pump_acks`].
    pub fn spawn_bulk_upload(&self, min_count: usize) {
        let candidates = self.unsynced_batch(self.config.max_batch_size);
        if candidates.len() < min_count {
            tracing::debug!(
                pending = candidates.len(),
                min_count,
                "too few unsynced activities, skipping bulk upload"
            );
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            tracing::debug!("no async runtime; skipping bulk upload");
            return;
        };

        let client = self.client.clone();
        let acks = self.acks_tx.clone();
        handle.spawn(async move {
            match client.bulk_log_activities(&candidates).await {
                Ok(accepted) => {
                    tracing::info!(uploaded = accepted.len(), "activity batch synced");
                    let _ = acks.send(accepted.iter().map(|entry| entry.id).collect());
                }
                Err(error) => {
                    tracing::warn!(%error, "bulk activity upload failed");
                }
            }
        });
    }

    /// Submit the learner's shape/sound entries for remote assessment.
    pub async fn fetch_assessment(&self) -> Result<Assessment> {
        let mut exercises = self.activities_of_kinds(&["shape", "sound"]);
        exercises.sort_by_key(|entry| entry.start_date().unwrap_or_else(Utc::now));
        if exercises.is_empty() {
            return Err(ServiceError::MissingInput);
        }

        let exercises: Vec<ActivityLogEntry> = exercises.into_iter().cloned().collect();
        self.client.fetch_assessment(&exercises).await
    }
}
