//! One generation run, start to finish.
//!
//! Stages are awaited strictly in order: clips, audio, assembly, then
//! captions when the owner has them enabled. A failure in the first three
//! fails the job. A caption failure leaves the uncaptioned base video as the
//! result. If the job stops being `processing` mid-run (the watchdog gave up
//! on it), the run is abandoned without further writes.

use std::sync::Arc;

use chrono::Utc;
use tracing::Instrument;

use reel_core::generation::{AudioResult, ClipResult};
use reel_core::settings::OwnerSettings;
use reel_core::types::{Timestamp, VideoId};
use reel_db::models::generation_detail::NewGenerationDetail;

use crate::capabilities::{CaptionFonts, Capabilities};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::request::{GenerationPayload, UploadSpool};
use crate::stages::assembly::assemble;
use crate::stages::audio::synthesize_audio;
use crate::stages::captions::{caption_video, CaptionedVideo};
use crate::stages::clips::synthesize_clips;
use crate::stages::RunContext;
use crate::store::{CompletedJob, MusicCatalog, StatusStore};

// ---------------------------------------------------------------------------
// Progress texts
// ---------------------------------------------------------------------------

pub const STATUS_CLIPS: &str = "Generating clips";
pub const STATUS_AUDIO: &str = "Creating voiceover and music";
pub const STATUS_ASSEMBLY: &str = "Assembling video";
pub const STATUS_CAPTIONS: &str = "Adding captions";

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed { video_url: String, captioned: bool },
    Failed { error: String },
    /// The job was already terminal; nothing was written.
    Abandoned,
}

/// Runs generation jobs against one set of capabilities and stores.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn StatusStore>,
    music: Arc<dyn MusicCatalog>,
    caps: Arc<Capabilities>,
    fonts: CaptionFonts,
    spool: UploadSpool,
    config: Arc<PipelineConfig>,
}

/// What a finished run produced before the detail record is written.
struct Finished {
    video_url: String,
    captioned: bool,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn StatusStore>,
        music: Arc<dyn MusicCatalog>,
        caps: Arc<Capabilities>,
        fonts: CaptionFonts,
        spool: UploadSpool,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            store,
            music,
            caps,
            fonts,
            spool,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    /// Run job `video_id` to a terminal state. The job's spooled photos are
    /// removed whatever the outcome.
    pub async fn run(&self, video_id: VideoId, payload: &GenerationPayload) -> RunOutcome {
        let span = tracing::info_span!("generation", video_id = %video_id, owner_id = payload.owner_id);
        let outcome = self.execute(video_id, payload).instrument(span).await;
        self.spool.remove_job(video_id).await;
        outcome
    }

    async fn execute(&self, video_id: VideoId, payload: &GenerationPayload) -> RunOutcome {
        let started = Utc::now();
        tracing::info!(groups = payload.groups.len(), "Generation started");

        match self.stages(video_id, payload, started).await {
            Ok(Some(done)) => {
                tracing::info!(
                    captioned = done.captioned,
                    elapsed_secs = (Utc::now() - started).num_seconds(),
                    "Generation completed"
                );
                RunOutcome::Completed {
                    video_url: done.video_url,
                    captioned: done.captioned,
                }
            }
            Ok(None) => {
                tracing::warn!("Job no longer processing, run abandoned");
                RunOutcome::Abandoned
            }
            Err(err) => {
                let error = err.to_string();
                tracing::error!(stage = err.stage().map(|s| s.as_str()), error = %error, "Generation failed");
                match self.store.fail(video_id, &error).await {
                    Ok(true) => RunOutcome::Failed { error },
                    Ok(false) => RunOutcome::Abandoned,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to record job failure");
                        RunOutcome::Failed { error }
                    }
                }
            }
        }
    }

    /// The staged run. `Ok(None)` means the job went terminal elsewhere.
    async fn stages(
        &self,
        video_id: VideoId,
        payload: &GenerationPayload,
        started: Timestamp,
    ) -> Result<Option<Finished>, PipelineError> {
        let ctx = RunContext {
            video_id,
            owner_id: payload.owner_id,
            caps: &self.caps,
            config: &self.config,
        };

        if !self.store.set_progress(video_id, STATUS_CLIPS).await? {
            return Ok(None);
        }
        let settings = self.store.owner_settings(payload.owner_id).await?;
        let clips = synthesize_clips(&ctx, &self.spool, payload).await?;

        if !self.store.set_progress(video_id, STATUS_AUDIO).await? {
            return Ok(None);
        }
        let audio = synthesize_audio(&ctx, self.music.as_ref(), &payload.property, &settings, &clips).await?;

        if !self.store.set_progress(video_id, STATUS_ASSEMBLY).await? {
            return Ok(None);
        }
        let base = assemble(&ctx, &clips, &audio, &settings).await?;

        let mut captioned: Option<CaptionedVideo> = None;
        if settings.captions_enabled {
            if !self
                .store
                .publish_interim(video_id, &base.url, STATUS_CAPTIONS)
                .await?
            {
                return Ok(None);
            }
            match caption_video(
                &ctx,
                &self.fonts,
                &settings.caption_style,
                &base.url,
                &audio.voiceover_url,
                &audio.voiceover_script,
            )
            .await
            {
                Ok(video) => captioned = Some(video),
                Err(e) => {
                    tracing::warn!(error = %e, "Captioning failed, publishing uncaptioned video");
                }
            }
        }

        let video_url = captioned
            .as_ref()
            .map_or_else(|| base.url.clone(), |c| c.url.clone());
        let completed = CompletedJob {
            video_url: video_url.clone(),
            thumbnail_url: clips
                .first()
                .and_then(|c| c.source_image_urls.first().cloned()),
            duration_seconds: base.duration_seconds,
        };
        if !self.store.complete(video_id, &completed).await? {
            return Ok(None);
        }

        let detail = generation_detail(video_id, &clips, &audio, &settings, captioned.as_ref(), started);
        match detail {
            Ok(detail) => {
                if let Err(e) = self.store.record_detail(&detail).await {
                    tracing::error!(error = %e, "Failed to record generation detail");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to encode generation detail"),
        }

        Ok(Some(Finished {
            video_url,
            captioned: captioned.is_some(),
        }))
    }
}

fn generation_detail(
    video_id: VideoId,
    clips: &[ClipResult],
    audio: &AudioResult,
    settings: &OwnerSettings,
    captioned: Option<&CaptionedVideo>,
    started: Timestamp,
) -> Result<NewGenerationDetail, PipelineError> {
    // Snapshot whenever captioning was attempted, even if it failed.
    let caption_style = match settings.captions_enabled {
        true => Some(serde_json::to_value(&settings.caption_style)?),
        false => None,
    };
    Ok(NewGenerationDetail {
        video_id,
        clips: serde_json::to_value(clips)?,
        voiceover_script: audio.voiceover_script.clone(),
        voiceover_url: audio.voiceover_url.clone(),
        music_url: audio.music_url.clone(),
        music_source: audio.music_source.as_str().to_string(),
        captioned: captioned.is_some(),
        captions_srt: captioned.map(|c| c.srt.clone()),
        caption_style,
        processing_started_at: started,
        processing_finished_at: Utc::now(),
    })
}
