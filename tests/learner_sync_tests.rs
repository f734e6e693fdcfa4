// SPDX-License-Identifier: MIT

//! Learner record lifecycle tests: persistence, property rules, merge
//! semantics, and the legacy-schema migration, over the public API.

mod common;

use std::collections::BTreeMap;

use learner_kit::models::{LearnerRecord, PropertyValue};
use learner_kit::storage::{keys, StoredValue};
use uuid::Uuid;

#[test]
fn test_learner_survives_restart() {
    let store = common::test_store();

    let mut kit = common::test_kit_on(store.clone());
    let id = kit.learner.learner_id().unwrap();
    kit.set_user_property("language", "kk");
    kit.set_user_property("personalization_motivation", "habit");
    drop(kit);

    // Next launch on the same store restores identity and properties.
    let next = common::test_kit_on(store);
    assert_eq!(next.learner.learner_id(), Some(id));
    assert_eq!(
        next.learner.get_property("language").unwrap().to_string(),
        "kk"
    );
    assert_eq!(
        next.learner
            .get_property("personalization_motivation")
            .unwrap()
            .to_string(),
        "habit"
    );
}

#[test]
fn test_empty_property_writes_are_noops() {
    let mut kit = common::test_kit();
    kit.set_user_property("language", "en");
    let before = kit.learner.record().unwrap().clone();

    kit.set_user_property("", "x");
    kit.set_user_property("language", "");

    assert_eq!(kit.learner.record().unwrap(), &before);
    assert_eq!(
        kit.learner.get_property("language").unwrap().to_string(),
        "en"
    );
}

#[test]
fn test_record_round_trip() {
    let mut record = LearnerRecord::new(Uuid::new_v4());
    record.set_property("language", "en");
    record.set_property("app_open_count", 17i64);
    record.set_property("experiment_participant", true);

    let json = serde_json::to_string(&record).unwrap();
    let decoded: LearnerRecord = serde_json::from_str(&json).unwrap();

    assert_eq!(decoded, record);
}

#[test]
fn test_merge_semantics_end_to_end() {
    let mut local = LearnerRecord::new(Uuid::new_v4());
    local.set_property("lang", "en");
    local.set_property("city", "almaty");

    let mut remote = LearnerRecord::new(local.id);
    remote.set_property("lang", "ru");
    remote.set_property("gender", "2");
    remote.server_overrides = Some(BTreeMap::from([("lang".to_string(), true)]));

    let merged = local.merged_with_remote(&remote);

    // Overridden key: remote wins.
    assert_eq!(merged.get_property("lang").unwrap().to_string(), "ru");
    // Locally missing key: remote fills it.
    assert_eq!(merged.get_property("gender").unwrap().to_string(), "2");
    // Local-only key: preserved.
    assert_eq!(merged.get_property("city").unwrap().to_string(), "almaty");
    // Idempotent.
    assert_eq!(merged.merged_with_remote(&remote), merged);

    // Without the override, the local value wins instead.
    remote.server_overrides = None;
    let merged = local.merged_with_remote(&remote);
    assert_eq!(merged.get_property("lang").unwrap().to_string(), "en");
}

#[test]
fn test_legacy_record_migrates_on_kickstart() {
    let store = common::test_store();
    let legacy_id = "0a5f9f6e-3c34-4b8a-9f21-3a2f2dd6f1aa";
    store.store(
        keys::CURRENT_LEARNER,
        StoredValue::Text(format!(
            r#"{{
                "id": "{legacy_id}",
                "gender": 1,
                "country": "KZ",
                "age_range": "25-34",
                "fcm_token": "tok-1",
                "bundleVersionAtInstall": "92"
            }}"#
        )),
    );

    let kit = common::test_kit_on(store.clone());
    assert_eq!(
        kit.learner.learner_id().unwrap().to_string(),
        legacy_id
    );
    assert_eq!(kit.learner.get_property("country").unwrap().to_string(), "KZ");
    assert_eq!(
        kit.learner.get_property("age_range").unwrap().to_string(),
        "25-34"
    );

    // The migrated record was re-persisted in the canonical shape.
    let persisted = store.retrieve(keys::CURRENT_LEARNER).unwrap();
    let StoredValue::Text(json) = persisted else {
        panic!("expected text snapshot");
    };
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value.get("properties").is_some());
    assert!(value.get("country").is_none());
}

#[test]
fn test_predefined_analytics_id_migration() {
    let store = common::test_store();
    let kit = common::test_kit_on(store.clone());
    let original = kit.learner.learner_id().unwrap();
    drop(kit);

    let analytics_id = Uuid::new_v4();
    common::init_tracing();
    let mut kit = learner_kit::LearnerKit::new(learner_kit::config::Config::default(), store);
    kit.kickstart(Some(analytics_id), &[]);

    assert_ne!(kit.learner.learner_id(), Some(original));
    assert_eq!(kit.learner.learner_id(), Some(analytics_id));
}

#[test]
fn test_property_value_variants_round_trip_through_storage() {
    let store = common::test_store();
    let mut kit = common::test_kit_on(store.clone());
    kit.set_user_property("text", "hello");
    kit.set_user_property("count", 3i64);
    kit.set_user_property("flag", false);
    drop(kit);

    let next = common::test_kit_on(store);
    assert_eq!(
        next.learner.get_property("text"),
        Some(&PropertyValue::Text("hello".to_string()))
    );
    assert_eq!(
        next.learner.get_property("count"),
        Some(&PropertyValue::Number(3.0))
    );
    assert_eq!(
        next.learner.get_property("flag"),
        Some(&PropertyValue::Boolean(false))
    );
}
