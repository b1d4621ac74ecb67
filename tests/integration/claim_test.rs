//! Claim semantics against PostgreSQL: due filtering, leases, and
//! exclusivity under concurrent claimers.

use std::collections::HashSet;

use chrono::Duration;

use hookbox_database::HookStore;
use hookbox_entity::hook::HookStatus;

use crate::helpers::{self, TestDb};

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_claim_leases_only_due_hooks() {
    let db = TestDb::new().await;
    let now = helpers::now();
    let lease = Duration::seconds(300);

    let due = db.store.append(&helpers::push_hook(now)).await.unwrap();
    let deferred = db
        .store
        .append(&helpers::push_hook(now + Duration::seconds(300)))
        .await
        .unwrap();

    let claimed = db.store.claim_batch(now, lease, 10).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, due.id);
    assert_eq!(claimed[0].locked_at, Some(now));
    assert!(claimed[0].lock_identifier.is_some());

    // Leased rows are skipped until the lease runs out.
    assert!(db.store.claim_batch(now, lease, 10).await.unwrap().is_empty());

    let at_boundary = now + Duration::seconds(299);
    assert!(db.store.claim_batch(at_boundary, lease, 10).await.unwrap().is_empty());

    let later = now + Duration::seconds(301);
    let reclaimed = db.store.claim_batch(later, lease, 10).await.unwrap();
    let ids: HashSet<_> = reclaimed.iter().map(|h| h.id).collect();
    assert_eq!(ids, HashSet::from([due.id, deferred.id]));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_terminal_hooks_are_never_claimed() {
    let db = TestDb::new().await;
    let now = helpers::now();
    let lease = Duration::seconds(60);
    let hook = db.store.append(&helpers::push_hook(now)).await.unwrap();

    let claimed = db.store.claim_batch(now, lease, 1).await.unwrap();
    let token = claimed[0].lock_identifier.unwrap();
    let resolution =
        hookbox_entity::hook::HookResolution::completely_failed(3, serde_json::json!({}));
    assert!(db.store.finalize(hook.id, token, &resolution).await.unwrap());

    let far_future = now + Duration::days(30);
    assert!(db.store.claim_batch(far_future, lease, 10).await.unwrap().is_empty());
    let stored = db.store.find_by_id(hook.id).await.unwrap().unwrap();
    assert_eq!(stored.status, HookStatus::CompletelyFailed);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_claims_are_exclusive() {
    let db = TestDb::new().await;
    let now = helpers::now();
    for _ in 0..60 {
        db.store.append(&helpers::push_hook(now)).await.unwrap();
    }

    let claims = (0..8).map(|_| {
        let store = db.store.clone();
        async move {
            let mut mine = Vec::new();
            loop {
                let batch = store.claim_batch(now, Duration::seconds(60), 5).await.unwrap();
                if batch.is_empty() {
                    break;
                }
                mine.extend(batch.into_iter().map(|h| h.id));
            }
            mine
        }
    });
    let results = futures::future::join_all(claims).await;

    let all: Vec<_> = results.into_iter().flatten().collect();
    let unique: HashSet<_> = all.iter().copied().collect();
    assert_eq!(all.len(), 60);
    assert_eq!(unique.len(), 60);
}
