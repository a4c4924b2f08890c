//! Durable pipeline work items.

use reel_core::types::{Timestamp, VideoId};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `generation_tasks` table.
///
/// Lifecycle: created unclaimed by admission, claimed by a dispatcher,
/// heartbeat while the pipeline runs, finished when it ends either way.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationTask {
    pub video_id: VideoId,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub heartbeat_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
}
