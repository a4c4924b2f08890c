//! Database-backed tests for the job lifecycle. They need a Postgres
//! instance reachable through `DATABASE_URL`.

use chrono::{Duration, Utc};
use reel_db::models::status::VideoStatus;
use reel_db::models::video::NewVideo;
use reel_db::repositories::{
    AdmissionOutcome, AdmissionRepo, CreditRepo, GenerationTaskRepo, VideoRepo,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

fn new_video(owner_id: i64) -> NewVideo {
    NewVideo {
        id: Uuid::new_v4(),
        owner_id,
        title: "Sunny two-bed flat".into(),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn admission_debits_and_creates_task(pool: PgPool) {
    CreditRepo::grant(&pool, 7, 2).await.unwrap();
    let video = new_video(7);

    let outcome = AdmissionRepo::admit(&pool, &video, &json!({"k": 1})).await.unwrap();
    assert_eq!(outcome, AdmissionOutcome::Admitted);
    assert_eq!(CreditRepo::remaining(&pool, 7).await.unwrap(), 1);

    let row = VideoRepo::find_by_id(&pool, video.id).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(VideoStatus::Processing));
    assert!(GenerationTaskRepo::find(&pool, video.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn admission_without_credit_writes_nothing(pool: PgPool) {
    let video = new_video(8);
    let outcome = AdmissionRepo::admit(&pool, &video, &json!({})).await.unwrap();
    assert_eq!(outcome, AdmissionOutcome::InsufficientCredits);
    assert!(VideoRepo::find_by_id(&pool, video.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn duplicate_admission_keeps_credit(pool: PgPool) {
    CreditRepo::grant(&pool, 9, 3).await.unwrap();
    let video = new_video(9);
    AdmissionRepo::admit(&pool, &video, &json!({})).await.unwrap();

    let again = AdmissionRepo::admit(&pool, &video, &json!({})).await.unwrap();
    assert_eq!(again, AdmissionOutcome::Duplicate);
    assert_eq!(CreditRepo::remaining(&pool, 9).await.unwrap(), 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn concurrent_admissions_never_overdraw(pool: PgPool) {
    CreditRepo::grant(&pool, 10, 1).await.unwrap();
    let a = new_video(10);
    let b = new_video(10);

    let (meta_a, meta_b) = (json!({}), json!({}));
    let (ra, rb) = tokio::join!(
        AdmissionRepo::admit(&pool, &a, &meta_a),
        AdmissionRepo::admit(&pool, &b, &meta_b),
    );
    let outcomes = [ra.unwrap(), rb.unwrap()];
    let admitted = outcomes
        .iter()
        .filter(|o| **o == AdmissionOutcome::Admitted)
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(CreditRepo::remaining(&pool, 10).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn terminal_jobs_are_not_rewritten(pool: PgPool) {
    CreditRepo::grant(&pool, 11, 1).await.unwrap();
    let video = new_video(11);
    AdmissionRepo::admit(&pool, &video, &json!({})).await.unwrap();

    assert!(VideoRepo::publish_interim(&pool, video.id, "https://cdn/interim.mp4", "Adding captions")
        .await
        .unwrap());
    assert!(VideoRepo::fail(&pool, video.id, "Voiceover failed").await.unwrap());

    let row = VideoRepo::find_by_id(&pool, video.id).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(VideoStatus::Failed));
    assert!(row.video_url.is_none());

    assert!(!VideoRepo::complete(&pool, video.id, "https://cdn/final.mp4", None, 30.0)
        .await
        .unwrap());
    assert!(!VideoRepo::set_progress(&pool, video.id, "late").await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn claim_skips_claimed_tasks(pool: PgPool) {
    CreditRepo::grant(&pool, 12, 2).await.unwrap();
    let first = new_video(12);
    let second = new_video(12);
    AdmissionRepo::admit(&pool, &first, &json!({})).await.unwrap();
    AdmissionRepo::admit(&pool, &second, &json!({})).await.unwrap();

    let a = GenerationTaskRepo::claim_next(&pool).await.unwrap().unwrap();
    let b = GenerationTaskRepo::claim_next(&pool).await.unwrap().unwrap();
    assert_ne!(a.video_id, b.video_id);
    assert!(GenerationTaskRepo::claim_next(&pool).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn stale_claimed_jobs_are_failed(pool: PgPool) {
    CreditRepo::grant(&pool, 13, 2).await.unwrap();
    let running = new_video(13);
    let queued = new_video(13);
    AdmissionRepo::admit(&pool, &running, &json!({})).await.unwrap();
    GenerationTaskRepo::claim_next(&pool).await.unwrap();
    AdmissionRepo::admit(&pool, &queued, &json!({})).await.unwrap();

    // Everything claimed before "one minute from now" counts as stale.
    let failed = VideoRepo::fail_stale(
        &pool,
        Utc::now() + Duration::minutes(1),
        "Generation stalled: no progress reported",
    )
    .await
    .unwrap();
    assert_eq!(failed, vec![running.id]);

    let queued_row = VideoRepo::find_by_id(&pool, queued.id).await.unwrap().unwrap();
    assert_eq!(queued_row.status(), Some(VideoStatus::Processing));
    let task = GenerationTaskRepo::find(&pool, running.id).await.unwrap().unwrap();
    assert!(task.finished_at.is_some());
}
