//! Bearer-token extractor for handlers that act on behalf of an owner.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use reel_core::error::CoreError;
use reel_core::types::DbId;

use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::state::AppState;

/// The owner a request is made for. Rejects with 401 when the header is
/// missing, malformed, or carries a token that does not verify.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub owner_id: DbId,
}

fn unauthorized(message: &str) -> AppError {
    CoreError::Unauthorized(message.to_string()).into()
}

fn bearer(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| unauthorized("Authorization header is not valid ASCII"))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| unauthorized("Expected 'Authorization: Bearer <token>'"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)?;
        let claims = verify_token(token, &state.config.jwt).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            unauthorized("Invalid or expired token")
        })?;
        Ok(Self {
            owner_id: claims.sub,
        })
    }
}
