//! Append, finalize, transition, and purge against PostgreSQL.

use chrono::Duration;
use serde_json::json;

use hookbox_database::repositories::append_in;
use hookbox_database::{HookStore, ManualTransition};
use hookbox_entity::hook::{HookResolution, HookStatus};

use crate::helpers::{self, TestDb};

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_append_stores_queued_hook_without_lease() {
    let db = TestDb::new().await;
    let at = helpers::now() + Duration::minutes(5);

    let hook = db.store.append(&helpers::push_hook(at)).await.unwrap();
    assert_eq!(hook.status, HookStatus::Queued);
    assert_eq!(hook.failed_count, 0);
    assert_eq!(hook.execution_timestamp, at);
    assert_eq!(hook.event_type, "push.notification");
    assert!(hook.lock_identifier.is_none());
    assert!(hook.locked_at.is_none());

    let found = db.store.find_by_id(hook.id).await.unwrap().unwrap();
    assert_eq!(found.params, json!({ "message": "hello", "device_tokens": ["abc"] }));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_append_in_follows_the_callers_transaction() {
    let db = TestDb::new().await;
    let at = helpers::now();

    let mut tx = db.pool.begin().await.unwrap();
    let rolled_back = append_in(&mut *tx, &helpers::push_hook(at)).await.unwrap();
    tx.rollback().await.unwrap();
    assert!(db.store.find_by_id(rolled_back.id).await.unwrap().is_none());

    let mut tx = db.pool.begin().await.unwrap();
    let committed = append_in(&mut *tx, &helpers::push_hook(at)).await.unwrap();
    tx.commit().await.unwrap();
    assert!(db.store.find_by_id(committed.id).await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_finalize_requires_matching_token_and_keeps_schedule_monotonic() {
    let db = TestDb::new().await;
    let now = helpers::now();
    let lease = Duration::seconds(60);
    let hook = db.store.append(&helpers::push_hook(now)).await.unwrap();

    let first = db.store.claim_batch(now, lease, 10).await.unwrap();
    let stale_token = first[0].lock_identifier.unwrap();

    let later = now + Duration::seconds(61);
    let second = db.store.claim_batch(later, lease, 10).await.unwrap();
    let live_token = second[0].lock_identifier.unwrap();
    assert_ne!(stale_token, live_token);

    let done = HookResolution::completed(0, json!({ "ok": true }));
    assert!(!db.store.finalize(hook.id, stale_token, &done).await.unwrap());

    // A retry scheduled in the past must not move the hook backwards.
    let backwards = HookResolution::retry(1, now - Duration::hours(1), json!({ "error": "x" }));
    assert!(db.store.finalize(hook.id, live_token, &backwards).await.unwrap());

    let stored = db.store.find_by_id(hook.id).await.unwrap().unwrap();
    assert_eq!(stored.status, HookStatus::Queued);
    assert_eq!(stored.failed_count, 1);
    assert_eq!(stored.execution_timestamp, now);
    assert!(stored.lock_identifier.is_none());
    assert!(stored.locked_at.is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_transitions_respect_status_and_lease() {
    let db = TestDb::new().await;
    let now = helpers::now();
    let lease = Duration::seconds(60);
    let hook = db.store.append(&helpers::push_hook(now)).await.unwrap();

    db.store.claim_batch(now, lease, 10).await.unwrap();
    let blocked = db
        .store
        .transition(hook.id, ManualTransition::Interrupt, now, lease)
        .await
        .unwrap();
    assert!(blocked.is_none());

    let after_expiry = now + Duration::seconds(120);
    let interrupted = db
        .store
        .transition(hook.id, ManualTransition::Interrupt, after_expiry, lease)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(interrupted.status, HookStatus::ManuallyInterrupted);
    assert!(interrupted.lock_identifier.is_none());

    // Terminal from here on: no further operator move and no claim.
    let reopened = db
        .store
        .transition(hook.id, ManualTransition::MarkHandled, after_expiry, lease)
        .await
        .unwrap();
    assert!(reopened.is_none());
    let claimed = db.store.claim_batch(after_expiry, lease, 10).await.unwrap();
    assert!(claimed.is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_purge_and_counts() {
    let db = TestDb::new().await;
    let now = helpers::now();
    let lease = Duration::seconds(60);

    let pending = db.store.append(&helpers::push_hook(now)).await.unwrap();
    let done = db.store.append(&helpers::push_hook(now)).await.unwrap();
    db.store
        .transition(done.id, ManualTransition::MarkHandled, now, lease)
        .await
        .unwrap()
        .unwrap();

    let counts = db.store.count_by_status().await.unwrap();
    assert_eq!(
        counts,
        vec![(HookStatus::Queued, 1), (HookStatus::ManuallyHandled, 1)]
    );

    let purged = db
        .store
        .purge(helpers::now() + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(purged, 1);

    let done = db.store.find_by_id(done.id).await.unwrap().unwrap();
    assert_eq!(done.status, HookStatus::Deleted);
    let pending = db.store.find_by_id(pending.id).await.unwrap().unwrap();
    assert_eq!(pending.status, HookStatus::Queued);
}
