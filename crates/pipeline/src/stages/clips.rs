//! Clip synthesis: one camera-motion clip per photo group.
//!
//! Groups run concurrently and are joined before the audio stage. One
//! failed group fails the stage, but its siblings still run to completion.

use futures::future::join_all;

use reel_core::capabilities::{
    ClipRequest, MediaKind, ProviderError, UploadOptions, UploadSource,
};
use reel_core::generation::ClipResult;
use reel_core::motion::{analysis_instructions, MotionPrompt, VisionAnalysis};
use reel_core::polling::poll_until;
use reel_core::property::PhotoGroupMode;

use super::RunContext;
use crate::error::{PipelineError, Stage};
use crate::request::{GenerationPayload, PhotoGroup, UploadSpool};

/// Synthesize every group's clip. Results are in group order.
pub async fn synthesize_clips(
    ctx: &RunContext<'_>,
    spool: &UploadSpool,
    payload: &GenerationPayload,
) -> Result<Vec<ClipResult>, PipelineError> {
    let test_mode = payload.property.is_test_mode();
    if test_mode && ctx.config.test_clip_urls.is_empty() {
        return Err(PipelineError::Validation(
            "test mode requested but no placeholder clips are configured".into(),
        ));
    }

    let runs = payload
        .groups
        .iter()
        .enumerate()
        .map(|(slot, group)| synthesize_group(ctx, spool, slot, group, test_mode));
    let results = join_all(runs).await;

    let clips = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    tracing::info!(video_id = %ctx.video_id, clips = clips.len(), test_mode, "Clips ready");
    Ok(clips)
}

async fn synthesize_group(
    ctx: &RunContext<'_>,
    spool: &UploadSpool,
    slot: usize,
    group: &PhotoGroup,
    test_mode: bool,
) -> Result<ClipResult, PipelineError> {
    let is_pair = group.mode == PhotoGroupMode::Keyframes;
    let image_urls = upload_images(ctx, spool, slot, group).await?;

    if test_mode {
        let placeholders = &ctx.config.test_clip_urls;
        return Ok(ClipResult {
            slot_index: slot,
            source_image_urls: image_urls,
            is_keyframe_pair: is_pair,
            motion_prompt: MotionPrompt::Static,
            clip_url: placeholders[slot % placeholders.len()].clone(),
            mood: "neutral".into(),
            description: "Placeholder clip".into(),
        });
    }

    let raw = ctx
        .caps
        .vision
        .analyze(&image_urls, &analysis_instructions(is_pair))
        .await
        .map_err(|e| PipelineError::provider(Stage::Clips, e))?;
    let analysis = VisionAnalysis::validate(raw)
        .map_err(|e| PipelineError::schema(Stage::Clips, e.to_string()))?;

    let start_image_url = image_urls
        .first()
        .cloned()
        .ok_or_else(|| PipelineError::Validation(format!("photo group {slot} has no images")))?;
    let request = ClipRequest {
        prompt: analysis.motion_prompt.as_str().to_string(),
        start_image_url,
        end_image_url: if is_pair { image_urls.get(1).cloned() } else { None },
        duration_seconds: ctx.config.clip_seconds,
    };

    let video = ctx.caps.video.as_ref();
    let job_id = video
        .submit(&request)
        .await
        .map_err(|e| PipelineError::provider(Stage::Clips, e))?;
    tracing::debug!(video_id = %ctx.video_id, slot, job_id = %job_id, motion = %analysis.motion_prompt, "Clip submitted");

    let job = job_id.as_str();
    let clip_url = poll_until(&ctx.config.clip_poll, "clip", move |_| async move {
        video.status(job).await?.into_poll_state()
    })
    .await
    .map_err(|e| {
        let err = PipelineError::provider(Stage::Clips, ProviderError::from(e));
        tracing::warn!(video_id = %ctx.video_id, slot, error = %err, "Clip synthesis failed");
        err
    })?;

    Ok(ClipResult {
        slot_index: slot,
        source_image_urls: image_urls,
        is_keyframe_pair: is_pair,
        motion_prompt: analysis.motion_prompt,
        clip_url,
        mood: analysis.mood,
        description: analysis.description,
    })
}

/// Move a group's photos from the spool to storage.
async fn upload_images(
    ctx: &RunContext<'_>,
    spool: &UploadSpool,
    slot: usize,
    group: &PhotoGroup,
) -> Result<Vec<String>, PipelineError> {
    let mut urls = Vec::with_capacity(group.images.len());
    for (index, image) in group.images.iter().enumerate() {
        let data = spool.read(image).await?;
        let options = UploadOptions::new(ctx.folder("photos"), MediaKind::Image)
            .with_public_id(format!("g{slot}_{index}"));
        let asset = ctx
            .caps
            .storage
            .upload(
                UploadSource::Bytes {
                    data,
                    filename: image.filename.clone(),
                    content_type: image.content_type.clone(),
                },
                &options,
            )
            .await
            .map_err(|e| PipelineError::provider(Stage::Clips, e))?;
        urls.push(asset.url);
    }
    Ok(urls)
}
