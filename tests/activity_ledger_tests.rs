// SPDX-License-Identifier: MIT

//! Activity ledger tests over the public API: deduplication, persistence
//! across relaunches, batching thresholds, and acknowledgment handling.

mod common;

use chrono::Utc;
use learner_kit::error::ServiceError;
use learner_kit::models::ActivityValue;
use uuid::Uuid;

#[test]
fn test_ledger_survives_restart() {
    let store = common::test_store();

    let mut kit = common::test_kit_on(store.clone());
    kit.log_activity("lesson-1", "quiz", Some(ActivityValue::from(80i64)), Utc::now());
    kit.log_activity("lesson-2", "audio", None, Utc::now());
    let ids: Vec<Uuid> = kit.activities.history().iter().map(|e| e.id).collect();
    drop(kit);

    let next = common::test_kit_on(store);
    let restored: Vec<Uuid> = next.activities.history().iter().map(|e| e.id).collect();
    assert_eq!(restored, ids);
    assert_eq!(
        next.activities.query(Some("lesson-1"), Some("quiz"), Some("80")).len(),
        1
    );
}

#[test]
fn test_replayed_entry_is_ignored_after_restart() {
    let store = common::test_store();

    let mut kit = common::test_kit_on(store.clone());
    kit.log_activity("lesson-1", "quiz", Some(ActivityValue::from(80i64)), Utc::now());
    let entry = kit.activities.history()[0].clone();
    drop(kit);

    // A crash-replayed append of the same entry must not duplicate it.
    let mut next = common::test_kit_on(store);
    next.activities.append(entry);
    assert_eq!(next.activities.history().len(), 1);
}

#[tokio::test]
async fn test_sync_batch_below_minimum_touches_nothing() {
    let mut kit = common::test_kit();
    for i in 0..40 {
        kit.log_activity(&format!("lesson-{i}"), "action", None, Utc::now());
    }

    let result = kit.activities.sync_batch(100).await;
    assert!(matches!(result, Err(ServiceError::MissingInput)));
    assert!(kit
        .activities
        .history()
        .iter()
        .all(|entry| !kit.activities.is_synced(entry.id)));
}

#[test]
fn test_acknowledged_entries_leave_the_upload_set() {
    let mut kit = common::test_kit();
    kit.log_activity("a", "action", None, Utc::now());
    kit.log_activity("b", "action", None, Utc::now());
    kit.log_activity("c", "action", None, Utc::now());

    let acked: Vec<Uuid> = kit.activities.history()[..2].iter().map(|e| e.id).collect();
    kit.activities.mark_synced(&acked);

    let batch = kit.activities.unsynced_batch(500);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].activity_id, "c");

    // Markers persist with the store, so they survive a relaunch too.
    let store = kit.storage.clone();
    drop(kit);
    let next = common::test_kit_on(store);
    assert_eq!(next.activities.unsynced_batch(500).len(), 1);
}

#[test]
fn test_batch_order_and_cap() {
    let mut kit = common::test_kit();
    // Logged newest-first; upload order must be by start date ascending.
    for i in (0..4).rev() {
        kit.log_activity(
            &format!("day-{i}"),
            "action",
            None,
            Utc::now() - chrono::Duration::days(i),
        );
    }

    let batch = kit.activities.unsynced_batch(500);
    let order: Vec<&str> = batch.iter().map(|e| e.activity_id.as_str()).collect();
    assert_eq!(order, ["day-3", "day-2", "day-1", "day-0"]);

    let capped = kit.activities.unsynced_batch(2);
    assert_eq!(capped.len(), 2);
    assert_eq!(capped[0].activity_id, "day-3");
}

#[test]
fn test_entries_carry_learner_identity_and_build() {
    let mut kit = common::test_kit();
    kit.log_activity("lesson-1", "quiz", Some(ActivityValue::from("80")), Utc::now());

    let entry = &kit.activities.history()[0];
    assert_eq!(entry.learner_id, kit.learner.learner_id().unwrap());
    assert_eq!(entry.build_version.as_deref(), Some("0"));
    assert!(entry.start_date().is_some());
    assert!(entry.completion_date().is_some());
}

#[test]
fn test_launch_counting_feeds_the_ledger() {
    let store = common::test_store();

    let mut kit = common::test_kit_on(store.clone());
    kit.increment_launch_count();
    drop(kit);

    let mut next = common::test_kit_on(store);
    next.increment_launch_count();

    assert_eq!(next.launch_count(), 2);
    let launches = next.activities.query(Some("launch"), Some("action"), None);
    assert_eq!(launches.len(), 2);
    assert_eq!(
        next.learner.get_property("app_open_count").unwrap().to_string(),
        "2"
    );
}
