//! Admission gate: validation, credit accounting, duplicates.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use futures::future::join_all;
use uuid::Uuid;

use reel_core::property::PhotoGroupMode;
use reel_pipeline::admission::{admit, AdmissionError};
use reel_pipeline::{MemoryStatusStore, StatusStore};

use common::OWNER;

#[tokio::test]
async fn concurrent_admissions_spend_one_credit() {
    let spool = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStatusStore::new());
    store.grant_credits(OWNER, 1).await;

    let mut attempts = Vec::new();
    for _ in 0..8 {
        let id = Uuid::new_v4();
        let payload = common::payload(spool.path(), id, "Flat", &[PhotoGroupMode::Single]).await;
        attempts.push((id, payload));
    }
    let results = join_all(
        attempts
            .iter()
            .map(|(id, payload)| admit(store.as_ref(), *id, payload)),
    )
    .await;

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(AdmissionError::InsufficientCredits))));
    assert_eq!(store.credits(OWNER).await.unwrap(), 0);
    assert_eq!(store.job_count().await, 1);
}

#[tokio::test]
async fn zero_balance_creates_nothing() {
    let spool = tempfile::tempdir().unwrap();
    let store = MemoryStatusStore::new();
    let id = Uuid::new_v4();
    let payload = common::payload(spool.path(), id, "Flat", &[PhotoGroupMode::Single]).await;

    assert_matches!(admit(&store, id, &payload).await, Err(AdmissionError::InsufficientCredits));
    assert_eq!(store.job_count().await, 0);
    assert!(store.task(id).await.is_none());
    assert_eq!(store.credits(OWNER).await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_job_id_is_rejected_without_debit() {
    let spool = tempfile::tempdir().unwrap();
    let store = MemoryStatusStore::new();
    store.grant_credits(OWNER, 3).await;
    let id = Uuid::new_v4();
    let payload = common::payload(spool.path(), id, "Flat", &[PhotoGroupMode::Single]).await;

    admit(&store, id, &payload).await.unwrap();
    assert_matches!(admit(&store, id, &payload).await, Err(AdmissionError::Duplicate(dup)) if dup == id);
    assert_eq!(store.credits(OWNER).await.unwrap(), 2);
}

#[tokio::test]
async fn invalid_request_is_rejected_before_credits() {
    let spool = tempfile::tempdir().unwrap();
    let store = MemoryStatusStore::new();
    store.grant_credits(OWNER, 1).await;
    let id = Uuid::new_v4();
    let mut payload = common::payload(spool.path(), id, "Flat", &[PhotoGroupMode::Keyframes]).await;
    payload.groups[0].images.pop();

    assert_matches!(admit(&store, id, &payload).await, Err(AdmissionError::Validation(msg)) if msg.contains("Keyframes"));
    assert_eq!(store.credits(OWNER).await.unwrap(), 1);
    assert_eq!(store.job_count().await, 0);
}

#[tokio::test]
async fn admitted_job_is_queued() {
    let spool = tempfile::tempdir().unwrap();
    let store = MemoryStatusStore::new();
    store.grant_credits(OWNER, 1).await;
    let id = Uuid::new_v4();
    let payload = common::payload(spool.path(), id, "  Harbour view  ", &[PhotoGroupMode::Single]).await;

    admit(&store, id, &payload).await.unwrap();

    let job = store.job(id).await.unwrap().unwrap();
    assert_eq!(job.title, "Harbour view");
    assert_eq!(job.processing_status_text.as_deref(), Some("Queued"));
    let task = store.task(id).await.unwrap();
    assert!(task.claimed_at.is_none());
    assert_eq!(task.payload["ownerId"], OWNER);
}
