//! In-process store for tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use reel_core::settings::OwnerSettings;
use reel_core::types::{DbId, Timestamp, VideoId};
use reel_db::models::generation_detail::NewGenerationDetail;
use reel_db::models::generation_task::GenerationTask;
use reel_db::models::status::VideoStatus;
use reel_db::models::video::{NewVideo, Video};
use reel_db::repositories::admission_repo::QUEUED_STATUS_TEXT;
use reel_db::repositories::AdmissionOutcome;

use super::{CompletedJob, MusicCatalog, MusicTrack, StatusStore, StoreError};

#[derive(Default)]
struct Inner {
    videos: HashMap<VideoId, Video>,
    credits: HashMap<DbId, i32>,
    /// Insertion order is claim order.
    tasks: Vec<GenerationTask>,
    details: HashMap<VideoId, NewGenerationDetail>,
    settings: HashMap<DbId, OwnerSettings>,
    library: HashMap<DbId, MusicTrack>,
    custom: HashMap<DbId, (DbId, MusicTrack)>,
}

impl Inner {
    /// Apply `update` if the job exists and is still processing.
    fn update_processing(&mut self, id: VideoId, update: impl FnOnce(&mut Video)) -> bool {
        match self.videos.get_mut(&id) {
            Some(video) if video.status() == Some(VideoStatus::Processing) => {
                update(video);
                video.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    fn task_mut(&mut self, id: VideoId) -> Option<&mut GenerationTask> {
        self.tasks.iter_mut().find(|t| t.video_id == id)
    }
}

/// A [`StatusStore`] and [`MusicCatalog`] held in memory behind one lock.
#[derive(Default)]
pub struct MemoryStatusStore {
    inner: Mutex<Inner>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn grant_credits(&self, owner_id: DbId, amount: i32) {
        *self.inner.lock().await.credits.entry(owner_id).or_insert(0) += amount;
    }

    pub async fn put_settings(&self, owner_id: DbId, settings: OwnerSettings) {
        self.inner.lock().await.settings.insert(owner_id, settings);
    }

    pub async fn add_library_track(&self, track_id: DbId, track: MusicTrack) {
        self.inner.lock().await.library.insert(track_id, track);
    }

    pub async fn add_custom_upload(&self, upload_id: DbId, owner_id: DbId, track: MusicTrack) {
        self.inner
            .lock()
            .await
            .custom
            .insert(upload_id, (owner_id, track));
    }

    pub async fn detail(&self, id: VideoId) -> Option<NewGenerationDetail> {
        self.inner.lock().await.details.get(&id).cloned()
    }

    pub async fn task(&self, id: VideoId) -> Option<GenerationTask> {
        self.inner
            .lock()
            .await
            .tasks
            .iter()
            .find(|t| t.video_id == id)
            .cloned()
    }

    pub async fn job_count(&self) -> usize {
        self.inner.lock().await.videos.len()
    }

    /// Move a task's last sign of life to `at`.
    pub async fn set_heartbeat(&self, id: VideoId, at: Timestamp) {
        if let Some(task) = self.inner.lock().await.task_mut(id) {
            task.heartbeat_at = Some(at);
        }
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn credits(&self, owner_id: DbId) -> Result<i32, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .credits
            .get(&owner_id)
            .copied()
            .unwrap_or(0))
    }

    async fn admit(
        &self,
        video: &NewVideo,
        payload: &serde_json::Value,
    ) -> Result<AdmissionOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.videos.contains_key(&video.id) {
            return Ok(AdmissionOutcome::Duplicate);
        }
        match inner.credits.get_mut(&video.owner_id) {
            Some(remaining) if *remaining > 0 => *remaining -= 1,
            _ => return Ok(AdmissionOutcome::InsufficientCredits),
        }

        let now = Utc::now();
        inner.videos.insert(
            video.id,
            Video {
                id: video.id,
                owner_id: video.owner_id,
                status_id: VideoStatus::Processing.id(),
                title: video.title.clone(),
                video_url: None,
                thumbnail_url: None,
                duration_seconds: None,
                error_text: None,
                processing_status_text: Some(QUEUED_STATUS_TEXT.to_string()),
                created_at: now,
                updated_at: now,
                completed_at: None,
            },
        );
        inner.tasks.push(GenerationTask {
            video_id: video.id,
            payload: payload.clone(),
            created_at: now,
            claimed_at: None,
            heartbeat_at: None,
            finished_at: None,
        });
        Ok(AdmissionOutcome::Admitted)
    }

    async fn job(&self, id: VideoId) -> Result<Option<Video>, StoreError> {
        Ok(self.inner.lock().await.videos.get(&id).cloned())
    }

    async fn set_progress(&self, id: VideoId, status_text: &str) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.update_processing(id, |v| {
            v.processing_status_text = Some(status_text.to_string());
        }))
    }

    async fn publish_interim(
        &self,
        id: VideoId,
        video_url: &str,
        status_text: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.update_processing(id, |v| {
            v.video_url = Some(video_url.to_string());
            v.processing_status_text = Some(status_text.to_string());
        }))
    }

    async fn complete(&self, id: VideoId, result: &CompletedJob) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.update_processing(id, |v| {
            v.status_id = VideoStatus::Completed.id();
            v.video_url = Some(result.video_url.clone());
            v.thumbnail_url = result.thumbnail_url.clone();
            v.duration_seconds = Some(result.duration_seconds);
            v.processing_status_text = None;
            v.error_text = None;
            v.completed_at = Some(Utc::now());
        }))
    }

    async fn fail(&self, id: VideoId, error_text: &str) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.update_processing(id, |v| {
            v.status_id = VideoStatus::Failed.id();
            v.error_text = Some(error_text.to_string());
            v.video_url = None;
            v.processing_status_text = None;
        }))
    }

    async fn record_detail(&self, detail: &NewGenerationDetail) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .details
            .entry(detail.video_id)
            .or_insert_with(|| detail.clone());
        Ok(())
    }

    async fn owner_settings(&self, owner_id: DbId) -> Result<OwnerSettings, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .settings
            .get(&owner_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn claim_next(&self) -> Result<Option<GenerationTask>, StoreError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        Ok(inner
            .tasks
            .iter_mut()
            .find(|t| t.claimed_at.is_none())
            .map(|task| {
                task.claimed_at = Some(now);
                task.heartbeat_at = Some(now);
                task.clone()
            }))
    }

    async fn heartbeat(&self, id: VideoId) -> Result<(), StoreError> {
        if let Some(task) = self.inner.lock().await.task_mut(id) {
            if task.finished_at.is_none() {
                task.heartbeat_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn finish_task(&self, id: VideoId) -> Result<(), StoreError> {
        if let Some(task) = self.inner.lock().await.task_mut(id) {
            task.finished_at.get_or_insert_with(Utc::now);
        }
        Ok(())
    }

    async fn fail_stale(
        &self,
        stale_before: Timestamp,
        error_text: &str,
    ) -> Result<Vec<VideoId>, StoreError> {
        let mut inner = self.inner.lock().await;
        let stale: Vec<VideoId> = inner
            .tasks
            .iter()
            .filter(|t| t.finished_at.is_none())
            .filter(|t| match t.heartbeat_at.or(t.claimed_at) {
                Some(last) => t.claimed_at.is_some() && last < stale_before,
                None => false,
            })
            .map(|t| t.video_id)
            .collect();

        let mut failed = Vec::new();
        for id in stale {
            let was_processing = inner.update_processing(id, |v| {
                v.status_id = VideoStatus::Failed.id();
                v.error_text = Some(error_text.to_string());
                v.video_url = None;
                v.processing_status_text = None;
            });
            if was_processing {
                if let Some(task) = inner.task_mut(id) {
                    task.finished_at = Some(Utc::now());
                }
                failed.push(id);
            }
        }
        Ok(failed)
    }
}

#[async_trait]
impl MusicCatalog for MemoryStatusStore {
    async fn library_track(&self, track_id: DbId) -> Result<Option<MusicTrack>, StoreError> {
        Ok(self.inner.lock().await.library.get(&track_id).cloned())
    }

    async fn custom_upload(
        &self,
        upload_id: DbId,
        owner_id: DbId,
    ) -> Result<Option<MusicTrack>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .custom
            .get(&upload_id)
            .filter(|(owner, _)| *owner == owner_id)
            .map(|(_, track)| track.clone()))
    }
}
