use axum::routing::{get, post};
use axum::Router;

use crate::handlers::videos;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(videos::create_video))
        .route("/{id}/status", get(videos::get_status))
}
