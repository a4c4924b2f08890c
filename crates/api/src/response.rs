//! Response bodies for the video endpoints.

use serde::Serialize;

use reel_core::types::VideoId;
use reel_db::models::video::Video;

/// `202 Accepted` body for a queued generation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedResponse {
    pub ok: bool,
    pub job_id: VideoId,
}

impl AcceptedResponse {
    pub fn new(job_id: VideoId) -> Self {
        Self { ok: true, job_id }
    }
}

/// What a client polls while a job runs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub status: &'static str,
    pub processing_status_text: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<f64>,
    pub error_text: Option<String>,
}

impl From<Video> for JobStatusResponse {
    fn from(video: Video) -> Self {
        Self {
            status: video.status().map_or("unknown", |s| s.as_str()),
            processing_status_text: video.processing_status_text,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            duration_seconds: video.duration_seconds,
            error_text: video.error_text,
        }
    }
}
