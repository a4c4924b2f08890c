#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use reel_api::auth::jwt::{issue_token, JwtConfig};
use reel_api::config::ServerConfig;
use reel_api::router::build_app_router;
use reel_api::state::AppState;
use reel_core::types::DbId;
use reel_pipeline::request::UploadSpool;
use reel_pipeline::MemoryStatusStore;

pub const BOUNDARY: &str = "reel-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(spool_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".into(),
            issuer: None,
            leeway_secs: 0,
        },
        upload_spool_dir: spool_dir.to_path_buf(),
        max_upload_bytes: 1024 * 1024,
    }
}

/// The full application over an in-memory store.
pub fn build_test_app(store: Arc<MemoryStatusStore>, spool_dir: &Path) -> Router {
    let config = test_config(spool_dir);
    let state = AppState {
        store,
        spool: UploadSpool::new(spool_dir),
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

pub fn token_for(owner_id: DbId, spool_dir: &Path) -> String {
    issue_token(owner_id, 900, &test_config(spool_dir).jwt).unwrap()
}

/// A multipart body under construction.
#[derive(Default)]
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
        self
    }

    pub fn image(mut self, group: usize, image: usize) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"group_{group}_image_{image}\"; \
                 filename=\"photo{group}{image}.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(b"\xff\xd8\xff\xe0fake-jpeg");
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn submit_request(token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/videos")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}
