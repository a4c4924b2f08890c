use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use reel_core::error::CoreError;
use reel_pipeline::admission::AdmissionError;
use reel_pipeline::StoreError;

/// Error returned by every handler. Renders as
/// `{ "ok": false, "error": <message>, "code": <CODE> }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request itself is malformed (multipart, JSON fields, ids).
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::Store(store) => Self::Store(store),
            other => Self::Core(other.into()),
        }
    }
}

/// Status, machine code and client-facing message for one error.
type Rendered = (StatusCode, &'static str, String);

impl AppError {
    fn render(&self) -> Rendered {
        match self {
            Self::Core(err) => render_core(err),
            Self::Database(err) | Self::Store(StoreError::Database(err)) => render_sqlx(err),
            Self::Store(err) => hidden(err),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            Self::InternalError(msg) => hidden(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.render();
        let body = json!({ "ok": false, "error": message, "code": code });
        (status, Json(body)).into_response()
    }
}

fn render_core(err: &CoreError) -> Rendered {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        // The client shows a purchase prompt on this code.
        CoreError::InsufficientCredits => (
            StatusCode::PAYMENT_REQUIRED,
            "NO_VIDEO_CREDITS",
            "No video credits remaining".to_string(),
        ),
        CoreError::Internal(msg) => hidden(msg),
    }
}

/// `RowNotFound` is a 404 and a unique violation (SQLSTATE 23505) a 409.
/// Anything else is logged and hidden.
fn render_sqlx(err: &sqlx::Error) -> Rendered {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => (
            StatusCode::CONFLICT,
            "CONFLICT",
            "Resource already exists".to_string(),
        ),
        other => hidden(other),
    }
}

fn hidden(detail: &dyn std::fmt::Display) -> Rendered {
    tracing::error!(error = %detail, "Request failed with an internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
