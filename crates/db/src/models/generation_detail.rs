//! The once-written record of what a completed run produced.

use reel_core::types::{Timestamp, VideoId};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `generation_details` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationDetail {
    pub video_id: VideoId,
    pub clips: serde_json::Value,
    pub voiceover_script: String,
    pub voiceover_url: String,
    pub music_url: String,
    pub music_source: String,
    pub captioned: bool,
    pub captions_srt: Option<String>,
    pub caption_style: Option<serde_json::Value>,
    pub processing_started_at: Timestamp,
    pub processing_finished_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for writing the detail record at completion.
#[derive(Debug, Clone)]
pub struct NewGenerationDetail {
    pub video_id: VideoId,
    pub clips: serde_json::Value,
    pub voiceover_script: String,
    pub voiceover_url: String,
    pub music_url: String,
    pub music_source: String,
    pub captioned: bool,
    pub captions_srt: Option<String>,
    pub caption_style: Option<serde_json::Value>,
    pub processing_started_at: Timestamp,
    pub processing_finished_at: Timestamp,
}
