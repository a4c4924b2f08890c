//! Persistence seams used by admission, the orchestrator and the
//! background loops.
//!
//! [`PgStatusStore`] is the production implementation over `reel-db`;
//! [`MemoryStatusStore`] keeps everything in process for tests and local
//! runs. Every job mutation is a no-op unless the job is still
//! processing, so a terminal job never regresses.

mod memory;
mod postgres;

use async_trait::async_trait;

use reel_core::settings::OwnerSettings;
use reel_core::types::{DbId, Timestamp, VideoId};
use reel_db::models::generation_detail::NewGenerationDetail;
use reel_db::models::generation_task::GenerationTask;
use reel_db::models::video::{NewVideo, Video};
use reel_db::repositories::AdmissionOutcome;

pub use memory::MemoryStatusStore;
pub use postgres::PgStatusStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored data is malformed: {0}")]
    Malformed(String),
}

/// Final values written when a job completes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedJob {
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: f64,
}

/// Job, credit and task state.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Check the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Remaining credits for an owner (zero when the owner has no balance).
    async fn credits(&self, owner_id: DbId) -> Result<i32, StoreError>;

    /// Debit one credit and create the job and its task, atomically.
    async fn admit(
        &self,
        video: &NewVideo,
        payload: &serde_json::Value,
    ) -> Result<AdmissionOutcome, StoreError>;

    async fn job(&self, id: VideoId) -> Result<Option<Video>, StoreError>;

    /// The following return `false` when the job is no longer processing.
    async fn set_progress(&self, id: VideoId, status_text: &str) -> Result<bool, StoreError>;

    async fn publish_interim(
        &self,
        id: VideoId,
        video_url: &str,
        status_text: &str,
    ) -> Result<bool, StoreError>;

    async fn complete(&self, id: VideoId, result: &CompletedJob) -> Result<bool, StoreError>;

    async fn fail(&self, id: VideoId, error_text: &str) -> Result<bool, StoreError>;

    /// Write the generation detail record; later writes are ignored.
    async fn record_detail(&self, detail: &NewGenerationDetail) -> Result<(), StoreError>;

    /// The owner's saved settings, or defaults.
    async fn owner_settings(&self, owner_id: DbId) -> Result<OwnerSettings, StoreError>;

    /// Claim the oldest unclaimed task, if any.
    async fn claim_next(&self) -> Result<Option<GenerationTask>, StoreError>;

    async fn heartbeat(&self, id: VideoId) -> Result<(), StoreError>;

    async fn finish_task(&self, id: VideoId) -> Result<(), StoreError>;

    /// Fail processing jobs whose claimed task last reported before
    /// `stale_before`. Returns the failed ids.
    async fn fail_stale(
        &self,
        stale_before: Timestamp,
        error_text: &str,
    ) -> Result<Vec<VideoId>, StoreError>;
}

/// A background track available to the music fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicTrack {
    pub url: String,
    pub duration_seconds: Option<f64>,
}

/// Lookup of library tracks and owner uploads.
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    /// An active library track.
    async fn library_track(&self, track_id: DbId) -> Result<Option<MusicTrack>, StoreError>;

    /// A custom upload, only if it belongs to `owner_id`.
    async fn custom_upload(
        &self,
        upload_id: DbId,
        owner_id: DbId,
    ) -> Result<Option<MusicTrack>, StoreError>;
}
