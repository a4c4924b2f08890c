//! Submission and status endpoints over an in-memory store.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use uuid::Uuid;

use reel_pipeline::{MemoryStatusStore, StatusStore};

use common::{body_json, build_test_app, get_request, send, submit_request, token_for, Form};

const OWNER: i64 = 11;
const PROPERTY: &str = r#"{"title":"Sea view flat","price":350000,"location":"Porto","beds":2}"#;

fn single_group_form(job_id: Uuid, owner: i64) -> Vec<u8> {
    Form::default()
        .text("ownerId", &owner.to_string())
        .text("jobId", &job_id.to_string())
        .text("property", PROPERTY)
        .text("groups", r#"[{"mode":"single"}]"#)
        .image(0, 0)
        .finish()
}

async fn store_with_credits(credits: i32) -> Arc<MemoryStatusStore> {
    let store = Arc::new(MemoryStatusStore::new());
    store.grant_credits(OWNER, credits).await;
    store
}

#[tokio::test]
async fn accepted_submission_queues_job() {
    let spool = tempfile::tempdir().unwrap();
    let store = store_with_credits(2).await;
    let app = build_test_app(store.clone(), spool.path());
    let token = token_for(OWNER, spool.path());
    let job_id = Uuid::new_v4();

    let response = send(app, submit_request(Some(&token), single_group_form(job_id, OWNER))).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(response.headers().contains_key("x-request-id"));
    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["jobId"], job_id.to_string());

    assert_eq!(store.credits(OWNER).await.unwrap(), 1);
    let task = store.task(job_id).await.unwrap();
    let image_path = task.payload["groups"][0]["images"][0]["path"].as_str().unwrap().to_string();
    assert!(std::path::Path::new(&image_path).exists());
}

#[tokio::test]
async fn keyframe_group_needs_two_images() {
    let spool = tempfile::tempdir().unwrap();
    let store = store_with_credits(1).await;
    let app = build_test_app(store.clone(), spool.path());
    let token = token_for(OWNER, spool.path());
    let job_id = Uuid::new_v4();
    let body = Form::default()
        .text("ownerId", &OWNER.to_string())
        .text("jobId", &job_id.to_string())
        .text("property", PROPERTY)
        .text("groups", r#"[{"mode":"keyframes"}]"#)
        .image(0, 0)
        .finish();

    let response = send(app, submit_request(Some(&token), body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert_eq!(store.credits(OWNER).await.unwrap(), 1);
    assert!(!spool.path().join(job_id.to_string()).exists());
}

#[tokio::test]
async fn no_credits_returns_402() {
    let spool = tempfile::tempdir().unwrap();
    let store = store_with_credits(0).await;
    let app = build_test_app(store.clone(), spool.path());
    let token = token_for(OWNER, spool.path());

    let response = send(app, submit_request(Some(&token), single_group_form(Uuid::new_v4(), OWNER))).await;

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let json = body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "NO_VIDEO_CREDITS");
    assert_eq!(store.job_count().await, 0);
}

#[tokio::test]
async fn owner_mismatch_returns_403() {
    let spool = tempfile::tempdir().unwrap();
    let store = store_with_credits(1).await;
    let app = build_test_app(store.clone(), spool.path());
    let token = token_for(OWNER, spool.path());

    let response = send(app, submit_request(Some(&token), single_group_form(Uuid::new_v4(), OWNER + 1))).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.credits(OWNER).await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_job_id_returns_409() {
    let spool = tempfile::tempdir().unwrap();
    let store = store_with_credits(2).await;
    let token = token_for(OWNER, spool.path());
    let job_id = Uuid::new_v4();

    let first = send(
        build_test_app(store.clone(), spool.path()),
        submit_request(Some(&token), single_group_form(job_id, OWNER)),
    )
    .await;
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = send(
        build_test_app(store.clone(), spool.path()),
        submit_request(Some(&token), single_group_form(job_id, OWNER)),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(store.credits(OWNER).await.unwrap(), 1);
    // The first job's photos are still spooled.
    assert!(spool.path().join(job_id.to_string()).exists());
}

#[tokio::test]
async fn in_flight_job_id_is_rejected_without_touching_its_photos() {
    let spool = tempfile::tempdir().unwrap();
    let store = store_with_credits(2).await;
    let token = token_for(OWNER, spool.path());
    let job_id = Uuid::new_v4();

    // Another request for the same id has spooled but not yet been admitted.
    let job_dir = spool.path().join(job_id.to_string());
    std::fs::create_dir(&job_dir).unwrap();
    std::fs::write(job_dir.join("g0_0.jpg"), b"first-upload").unwrap();

    let response = send(
        build_test_app(store.clone(), spool.path()),
        submit_request(Some(&token), single_group_form(job_id, OWNER)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(std::fs::read(job_dir.join("g0_0.jpg")).unwrap(), b"first-upload");
    assert_eq!(std::fs::read_dir(&job_dir).unwrap().count(), 1);
    assert_eq!(store.credits(OWNER).await.unwrap(), 2);
    assert!(store.job(job_id).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_token_returns_401() {
    let spool = tempfile::tempdir().unwrap();
    let store = store_with_credits(1).await;
    let app = build_test_app(store, spool.path());

    let response = send(app, submit_request(None, single_group_form(Uuid::new_v4(), OWNER))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_property_returns_400() {
    let spool = tempfile::tempdir().unwrap();
    let store = store_with_credits(1).await;
    let app = build_test_app(store, spool.path());
    let token = token_for(OWNER, spool.path());
    let body = Form::default()
        .text("ownerId", &OWNER.to_string())
        .text("jobId", &Uuid::new_v4().to_string())
        .text("property", "{not json")
        .text("groups", r#"[{"mode":"single"}]"#)
        .image(0, 0)
        .finish();

    let response = send(app, submit_request(Some(&token), body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn status_reports_progress_to_owner_only() {
    let spool = tempfile::tempdir().unwrap();
    let store = store_with_credits(1).await;
    let token = token_for(OWNER, spool.path());
    let job_id = Uuid::new_v4();
    send(
        build_test_app(store.clone(), spool.path()),
        submit_request(Some(&token), single_group_form(job_id, OWNER)),
    )
    .await;
    store.set_progress(job_id, "Generating clips").await.unwrap();

    let uri = format!("/api/v1/videos/{job_id}/status");
    let response = send(build_test_app(store.clone(), spool.path()), get_request(&uri, &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "processing");
    assert_eq!(json["processingStatusText"], "Generating clips");
    assert!(json["videoUrl"].is_null());

    let stranger = token_for(OWNER + 1, spool.path());
    let response = send(build_test_app(store, spool.path()), get_request(&uri, &stranger)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_ok() {
    let spool = tempfile::tempdir().unwrap();
    let app = build_test_app(Arc::new(MemoryStatusStore::new()), spool.path());
    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
}

#[tokio::test]
async fn health_degraded_without_spool() {
    let spool = tempfile::tempdir().unwrap();
    let missing = spool.path().join("not-created");
    let app = build_test_app(Arc::new(MemoryStatusStore::new()), &missing);
    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["spool_ready"], false);
}
