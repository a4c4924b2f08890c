//! `AppError` → HTTP response mapping, without a server.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use uuid::Uuid;

use reel_api::error::AppError;
use reel_core::error::CoreError;
use reel_pipeline::admission::AdmissionError;
use reel_pipeline::StoreError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn insufficient_credits_returns_402() {
    let (status, json) = error_to_response(AdmissionError::InsufficientCredits.into()).await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "NO_VIDEO_CREDITS");
}

#[tokio::test]
async fn admission_validation_returns_400() {
    let (status, json) =
        error_to_response(AdmissionError::Validation("price is required".into()).into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "price is required");
}

#[tokio::test]
async fn duplicate_job_returns_409() {
    let id = Uuid::new_v4();
    let (status, json) = error_to_response(AdmissionError::Duplicate(id).into()).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains(&id.to_string()));
}

#[tokio::test]
async fn not_found_returns_404() {
    let err = AppError::Core(CoreError::not_found("Video", "abc"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Video with id abc not found");
}

#[tokio::test]
async fn forbidden_returns_403() {
    let (status, json) = error_to_response(CoreError::Forbidden("not yours".into()).into()).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn store_errors_are_sanitized() {
    let err: AppError = StoreError::Malformed("payload column holds garbage".into()).into();

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}
