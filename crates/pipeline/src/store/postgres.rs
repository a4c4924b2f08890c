//! Postgres-backed store over the `reel-db` repositories.

use async_trait::async_trait;
use sqlx::PgPool;

use reel_core::settings::OwnerSettings;
use reel_core::types::{DbId, Timestamp, VideoId};
use reel_db::models::generation_detail::NewGenerationDetail;
use reel_db::models::generation_task::GenerationTask;
use reel_db::models::video::{NewVideo, Video};
use reel_db::repositories::{
    AdmissionOutcome, AdmissionRepo, CreditRepo, GenerationDetailRepo, GenerationTaskRepo,
    MusicRepo, OwnerSettingsRepo, VideoRepo,
};

use super::{CompletedJob, MusicCatalog, MusicTrack, StatusStore, StoreError};

#[derive(Clone)]
pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(reel_db::health_check(&self.pool).await?)
    }

    async fn credits(&self, owner_id: DbId) -> Result<i32, StoreError> {
        Ok(CreditRepo::remaining(&self.pool, owner_id).await?)
    }

    async fn admit(
        &self,
        video: &NewVideo,
        payload: &serde_json::Value,
    ) -> Result<AdmissionOutcome, StoreError> {
        Ok(AdmissionRepo::admit(&self.pool, video, payload).await?)
    }

    async fn job(&self, id: VideoId) -> Result<Option<Video>, StoreError> {
        Ok(VideoRepo::find_by_id(&self.pool, id).await?)
    }

    async fn set_progress(&self, id: VideoId, status_text: &str) -> Result<bool, StoreError> {
        Ok(VideoRepo::set_progress(&self.pool, id, status_text).await?)
    }

    async fn publish_interim(
        &self,
        id: VideoId,
        video_url: &str,
        status_text: &str,
    ) -> Result<bool, StoreError> {
        Ok(VideoRepo::publish_interim(&self.pool, id, video_url, status_text).await?)
    }

    async fn complete(&self, id: VideoId, result: &CompletedJob) -> Result<bool, StoreError> {
        Ok(VideoRepo::complete(
            &self.pool,
            id,
            &result.video_url,
            result.thumbnail_url.as_deref(),
            result.duration_seconds,
        )
        .await?)
    }

    async fn fail(&self, id: VideoId, error_text: &str) -> Result<bool, StoreError> {
        Ok(VideoRepo::fail(&self.pool, id, error_text).await?)
    }

    async fn record_detail(&self, detail: &NewGenerationDetail) -> Result<(), StoreError> {
        if !GenerationDetailRepo::insert(&self.pool, detail).await? {
            tracing::warn!(video_id = %detail.video_id, "Generation detail already recorded");
        }
        Ok(())
    }

    async fn owner_settings(&self, owner_id: DbId) -> Result<OwnerSettings, StoreError> {
        Ok(OwnerSettingsRepo::find(&self.pool, owner_id)
            .await?
            .map(|row| OwnerSettings::from_json(row.settings))
            .unwrap_or_default())
    }

    async fn claim_next(&self) -> Result<Option<GenerationTask>, StoreError> {
        Ok(GenerationTaskRepo::claim_next(&self.pool).await?)
    }

    async fn heartbeat(&self, id: VideoId) -> Result<(), StoreError> {
        Ok(GenerationTaskRepo::heartbeat(&self.pool, id).await?)
    }

    async fn finish_task(&self, id: VideoId) -> Result<(), StoreError> {
        Ok(GenerationTaskRepo::finish(&self.pool, id).await?)
    }

    async fn fail_stale(
        &self,
        stale_before: Timestamp,
        error_text: &str,
    ) -> Result<Vec<VideoId>, StoreError> {
        Ok(VideoRepo::fail_stale(&self.pool, stale_before, error_text).await?)
    }
}

#[async_trait]
impl MusicCatalog for PgStatusStore {
    async fn library_track(&self, track_id: DbId) -> Result<Option<MusicTrack>, StoreError> {
        Ok(MusicRepo::find_library_track(&self.pool, track_id)
            .await?
            .map(|t| MusicTrack {
                url: t.url,
                duration_seconds: t.duration_seconds,
            }))
    }

    async fn custom_upload(
        &self,
        upload_id: DbId,
        owner_id: DbId,
    ) -> Result<Option<MusicTrack>, StoreError> {
        Ok(MusicRepo::find_custom_upload(&self.pool, upload_id, owner_id)
            .await?
            .map(|u| MusicTrack {
                url: u.url,
                duration_seconds: u.duration_seconds,
            }))
    }
}
