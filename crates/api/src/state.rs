use std::sync::Arc;

use reel_pipeline::request::UploadSpool;
use reel_pipeline::StatusStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Job, credit and task persistence.
    pub store: Arc<dyn StatusStore>,
    /// Photo spool shared with the worker.
    pub spool: UploadSpool,
    pub config: Arc<ServerConfig>,
}
