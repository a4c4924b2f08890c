pub mod health;
pub mod videos;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /videos                   submit a generation (POST)
/// /videos/{id}/status       poll a job (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/videos", videos::router())
}
