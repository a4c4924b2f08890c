//! Video job rows.

use serde::Serialize;
use sqlx::FromRow;
use reel_core::types::{DbId, Timestamp, VideoId};

use super::status::{StatusId, VideoStatus};

/// A row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: VideoId,
    pub owner_id: DbId,
    pub status_id: StatusId,
    pub title: String,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<f64>,
    pub error_text: Option<String>,
    pub processing_status_text: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl Video {
    pub fn status(&self) -> Option<VideoStatus> {
        VideoStatus::from_id(self.status_id)
    }
}

/// DTO for inserting a freshly admitted job.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub id: VideoId,
    pub owner_id: DbId,
    pub title: String,
}
