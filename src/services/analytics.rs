// SPDX-License-Identifier: MIT

//! Analytics facade: launch counting, activity logging, user properties.
//!
//! Thin convenience methods over the learner manager and the ledger; app
//! code calls these instead of wiring entries together by hand.

use chrono::{DateTime, Utc};

use crate::models::{ActivityLogEntry, ActivityValue, PropertyValue};
use crate::storage::{keys, StoredValue};
use crate::LearnerKit;

impl LearnerKit {
    /// Number of recorded app launches, reading the legacy counter key when
    /// the current one has never been written.
    pub fn launch_count(&self) -> i64 {
        let store = self.storage.as_ref();
        store
            .get_integer(keys::LAUNCH_COUNT)
            .or_else(|| store.get_integer(keys::LEGACY_LAUNCH_COUNT))
            .unwrap_or(0)
    }

    /// Bump the launch counter, ledger the launch, and mirror the count to
    /// the learner's `app_open_count` property.
    pub fn increment_launch_count(&mut self) {
        let count = self.launch_count() + 1;
        self.storage
            .store(keys::LAUNCH_COUNT, StoredValue::Integer(count));

        self.log_activity("launch", "action", Some(ActivityValue::from(count)), Utc::now());
        self.set_user_property("app_open_count", count.to_string());
    }

    /// Append an activity to the ledger, stamped with the learner id and the
    /// configured build version. Dropped with a warning if no learner exists
    /// yet (call `kickstart` first).
    pub fn log_activity(
        &mut self,
        activity_id: &str,
        kind: &str,
        value: Option<ActivityValue>,
        start_date: DateTime<Utc>,
    ) {
        tracing::debug!(activity_id, kind, value = ?value, "log activity");

        let Some(learner_id) = self.learner.learner_id() else {
            tracing::warn!(activity_id, "no learner id, activity dropped");
            return;
        };

        let entry = ActivityLogEntry::new(
            learner_id,
            activity_id,
            kind,
            value,
            start_date,
            Utc::now(),
            self.config.build_version.clone(),
        );
        self.activities.append(entry);
    }

    /// Set a learner property (empty keys/values are rejected downstream).
    pub fn set_user_property(&mut self, key: &str, value: impl Into<PropertyValue>) {
        self.learner.set_property(key, value);
    }
}
