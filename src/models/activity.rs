// SPDX-License-Identifier: MIT

//! Activity ledger entry model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time_utils;

/// Activity payload value.
///
/// Canonically a string; old app builds wrote JSON numbers, so decoding
/// accepts either. `min`/`max` selection parses the string as a decimal and
/// treats unparsable values as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityValue(String);

impl ActivityValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric-comparison convention: decimal parse, zero on failure.
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from_str(self.0.trim()).unwrap_or_default()
    }
}

impl fmt::Display for ActivityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ActivityValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for ActivityValue {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<f64> for ActivityValue {
    fn from(value: f64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for ActivityValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ActivityValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// One appended activity/engagement event.
///
/// Entries are immutable after creation; "uploaded" state lives in the
/// per-id sync-marker table, never on the entry itself. Timestamps are kept
/// in their wire string form and parsed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// Dedup key, locally and for remote acknowledgment.
    pub id: Uuid,
    pub learner_id: Uuid,
    /// Free-form activity name ("launch", a lesson id, ...).
    pub activity_id: String,
    /// Free-form category ("action", "audio", "quiz", ...).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ActivityValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completion_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_version: Option<String>,
}

impl ActivityLogEntry {
    /// Create an entry with a fresh id for the given learner.
    pub fn new(
        learner_id: Uuid,
        activity_id: impl Into<String>,
        kind: impl Into<String>,
        value: Option<ActivityValue>,
        start_date: DateTime<Utc>,
        completion_date: DateTime<Utc>,
        build_version: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            learner_id,
            activity_id: activity_id.into(),
            kind: kind.into(),
            value,
            start_date: Some(time_utils::format_timestamp(start_date)),
            completion_date: Some(time_utils::format_timestamp(completion_date)),
            build_version,
        }
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
            .as_deref()
            .and_then(time_utils::parse_timestamp)
    }

    pub fn completion_date(&self) -> Option<DateTime<Utc>> {
        self.completion_date
            .as_deref()
            .and_then(time_utils::parse_timestamp)
    }
}
