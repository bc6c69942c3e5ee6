//! Concurrent reconciliation tests
//!
//! The locate -> merge -> record sequence runs under `BEGIN IMMEDIATE`, so
//! concurrent observations against the same identifiers serialize on the
//! database write lock instead of racing the duplicate check.

mod helpers;

use helpers::{all_contacts, assert_invariants, test_pool};
use idlink_svc::reconcile::{self, Observation};

const CONCURRENT_REQUESTS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_observations_create_one_primary() {
    let (pool, _dir) = test_pool().await;

    let mut handles = Vec::with_capacity(CONCURRENT_REQUESTS);
    for _ in 0..CONCURRENT_REQUESTS {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let observation = Observation::new(
                Some("racer@x.io".to_string()),
                Some("424242".to_string()),
            );
            reconcile::identify(&pool, &observation).await
        }));
    }

    let mut primary_ids = Vec::new();
    for handle in handles {
        let projection = handle.await.unwrap().unwrap();
        assert!(projection.secondary_contact_ids.is_empty());
        primary_ids.push(projection.primary_contact_id);
    }

    // Every request resolved to the same single stored primary
    primary_ids.dedup();
    assert_eq!(primary_ids.len(), 1);
    assert_eq!(all_contacts(&pool).await.len(), 1);
    assert_invariants(&pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overlapping_observations_keep_invariants() {
    let (pool, _dir) = test_pool().await;

    // Same phone in every request, distinct emails: whatever the
    // interleaving, all requests must land in one cluster with one primary
    let mut handles = Vec::with_capacity(CONCURRENT_REQUESTS);
    for i in 0..CONCURRENT_REQUESTS {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let observation = Observation::new(
                Some(format!("user{i}@x.io")),
                Some("555000".to_string()),
            );
            reconcile::identify(&pool, &observation).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let contacts = all_contacts(&pool).await;
    assert_eq!(contacts.len(), CONCURRENT_REQUESTS);
    assert_eq!(contacts.iter().filter(|c| c.is_primary()).count(), 1);
    assert_invariants(&pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_observations_stay_separate() {
    let (pool, _dir) = test_pool().await;

    let mut handles = Vec::with_capacity(CONCURRENT_REQUESTS);
    for i in 0..CONCURRENT_REQUESTS {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let observation = Observation::new(
                Some(format!("solo{i}@x.io")),
                Some(format!("9000{i}")),
            );
            reconcile::identify(&pool, &observation).await
        }));
    }

    for handle in handles {
        let projection = handle.await.unwrap().unwrap();
        assert!(projection.secondary_contact_ids.is_empty());
    }

    let contacts = all_contacts(&pool).await;
    assert_eq!(contacts.len(), CONCURRENT_REQUESTS);
    assert_eq!(
        contacts.iter().filter(|c| c.is_primary()).count(),
        CONCURRENT_REQUESTS
    );
    assert_invariants(&pool).await;
}
