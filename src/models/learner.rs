// SPDX-License-Identifier: MIT

//! Learner record: identity plus a free-form property bag.
//!
//! This is the one canonical learner schema. Records persisted by old app
//! builds in the fixed-field shape (`gender`, `country`, `goal`, ...) are
//! migrated into the property bag when they are first decoded.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Property values are a tagged variant so the bag stays flexible without
/// runtime type inspection. Nested JSON travels as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    /// Only an empty text value counts as empty; numbers and booleans are
    /// always kept.
    pub fn is_empty(&self) -> bool {
        matches!(self, PropertyValue::Text(s) if s.is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a decoded JSON scalar. Objects and arrays become their JSON
    /// text; null is dropped.
    fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(PropertyValue::Boolean(b)),
            serde_json::Value::Number(n) => n.as_f64().map(PropertyValue::Number),
            serde_json::Value::String(s) => Some(PropertyValue::Text(s)),
            serde_json::Value::Null => None,
            nested => Some(PropertyValue::Text(nested.to_string())),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

/// One learner: stable identity plus properties.
///
/// Invariant: the bag never contains an empty key or an empty text value;
/// entries violating that are filtered on both encode and decode.
#[derive(Debug, Clone)]
pub struct LearnerRecord {
    pub id: Uuid,
    properties: BTreeMap<String, PropertyValue>,
    /// Per-key flags: `true` means the remote value always wins in a merge.
    pub server_overrides: Option<BTreeMap<String, bool>>,
}

/// Field names of the legacy fixed-field learner schema, migrated into the
/// property bag on decode.
const LEGACY_FIELDS: &[&str] = &[
    "gender",
    "language",
    "country",
    "city",
    "prior_knowledge",
    "goal",
    "age_range",
    "marketing_source",
    "fcm_token",
    "bundleVersionAtInstall",
];

impl LearnerRecord {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            properties: BTreeMap::new(),
            server_overrides: None,
        }
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Set a property, rejecting empty keys and empty text values.
    /// Returns whether the record changed.
    pub fn set_property(&mut self, key: &str, value: impl Into<PropertyValue>) -> bool {
        if key.is_empty() {
            tracing::warn!("attempted to set a property with an empty key");
            return false;
        }
        let value = value.into();
        if value.is_empty() {
            tracing::warn!(key, "attempted to set a property with an empty value");
            return false;
        }
        self.properties.insert(key.to_string(), value);
        true
    }

    /// Merge the remote copy into this (local) record.
    ///
    /// Local is the base: remote values win only for keys flagged in the
    /// remote override map, fill keys missing locally, and lose everywhere
    /// else. Keys present only locally are untouched. The remote override
    /// map is carried onto the result. Idempotent.
    pub fn merged_with_remote(&self, remote: &LearnerRecord) -> LearnerRecord {
        let mut merged = self.clone();
        merged.server_overrides = remote.server_overrides.clone();

        for (key, remote_value) in &remote.properties {
            let forced = remote
                .server_overrides
                .as_ref()
                .and_then(|overrides| overrides.get(key))
                .copied()
                .unwrap_or(false);

            if forced || !merged.properties.contains_key(key) {
                merged
                    .properties
                    .insert(key.clone(), remote_value.clone());
            }
        }

        merged
    }

    fn drop_empty_entries(&mut self) {
        self.properties
            .retain(|key, value| !key.is_empty() && !value.is_empty());
    }
}

/// Equality is id + properties; the override map is advisory and ignored.
impl PartialEq for LearnerRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.properties == other.properties
    }
}

#[derive(Serialize)]
struct WireOut<'a> {
    id: &'a Uuid,
    properties: BTreeMap<&'a str, &'a PropertyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_overrides: &'a Option<BTreeMap<String, bool>>,
}

impl Serialize for LearnerRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let properties = self
            .properties
            .iter()
            .filter(|(key, value)| !key.is_empty() && !value.is_empty())
            .map(|(key, value)| (key.as_str(), value))
            .collect();

        WireOut {
            id: &self.id,
            properties,
            server_overrides: &self.server_overrides,
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
struct WireIn {
    id: Uuid,
    #[serde(default)]
    properties: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, alias = "serverOverrides")]
    server_overrides: Option<BTreeMap<String, bool>>,
    /// Anything else on the record; legacy fixed fields are picked out of
    /// here, unknown keys are dropped.
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl<'de> Deserialize<'de> for LearnerRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireIn::deserialize(deserializer)?;

        let mut record = LearnerRecord::new(wire.id);
        record.server_overrides = wire.server_overrides;

        for (key, value) in wire.properties.unwrap_or_default() {
            if let Some(value) = PropertyValue::from_json(value) {
                record.properties.insert(key, value);
            }
        }

        // Legacy fixed-field schema: fold recognized fields into the bag.
        // The bag wins on collision.
        for (key, value) in wire.extra {
            if LEGACY_FIELDS.contains(&key.as_str())
                && !record.properties.contains_key(&key)
            {
                if let Some(value) = PropertyValue::from_json(value) {
                    record.properties.insert(key, value);
                }
            }
        }

        record.drop_empty_entries();
        Ok(record)
    }
}
