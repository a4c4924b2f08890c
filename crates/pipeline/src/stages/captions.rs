//! Captions: transcribe the narration, correct it against the script,
//! render styled overlay frames and burn them onto the base video.
//!
//! Any failure here leaves the uncaptioned base video as the job result;
//! the orchestrator decides that, this module just reports the error.

use futures::future::try_join_all;

use reel_core::capabilities::{MediaKind, UploadOptions, UploadSource};
use reel_core::captions::{srt, CaptionCue, CaptionRenderer, CaptionStyle};
use reel_core::composition::{build_caption_overlay, UploadedFrame};

use super::RunContext;
use crate::capabilities::CaptionFonts;
use crate::error::{PipelineError, Stage};

/// The final captioned video and the subtitles burned into it.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionedVideo {
    pub url: String,
    pub srt: String,
}

pub async fn caption_video(
    ctx: &RunContext<'_>,
    fonts: &CaptionFonts,
    style: &CaptionStyle,
    base_video_url: &str,
    voiceover_url: &str,
    script: &str,
) -> Result<CaptionedVideo, PipelineError> {
    let cues = corrected_cues(ctx, voiceover_url, script).await?;
    let srt_text = srt::format(&cues);

    let glyphs = fonts.load(&style.font_family, style.font_weight)?;
    let renderer = CaptionRenderer::new(glyphs, ctx.config.frame_width, ctx.config.frame_height);

    let mut uploaded = Vec::new();
    for cue in &cues {
        uploaded.extend(render_and_upload(ctx, &renderer, cue, style).await?);
    }
    tracing::debug!(video_id = %ctx.video_id, cues = cues.len(), frames = uploaded.len(), "Caption frames uploaded");

    let composition = build_caption_overlay(base_video_url, &uploaded);
    let asset = ctx
        .caps
        .compositor
        .materialize(&composition, &ctx.config.materialize_poll)
        .await
        .map_err(|e| PipelineError::provider(Stage::Captions, e))?;

    tracing::info!(video_id = %ctx.video_id, url = %asset.url, "Captioned video ready");
    Ok(CaptionedVideo {
        url: asset.url,
        srt: srt_text,
    })
}

/// Transcribe the voiceover and correct the cue text against the script.
/// Word timings from the transcript are kept where cue word counts allow.
pub async fn corrected_cues(
    ctx: &RunContext<'_>,
    voiceover_url: &str,
    script: &str,
) -> Result<Vec<CaptionCue>, PipelineError> {
    let transcript = ctx
        .caps
        .transcriber
        .transcribe(voiceover_url)
        .await
        .map_err(|e| PipelineError::provider(Stage::Captions, e))?;

    let corrected = ctx
        .caps
        .corrector
        .correct(&transcript.to_srt(), script)
        .await
        .map_err(|e| PipelineError::provider(Stage::Captions, e))?;

    let mut cues = srt::parse(&corrected);
    if cues.is_empty() {
        return Err(PipelineError::schema(Stage::Captions, "corrected transcript has no cues"));
    }
    srt::attach_word_timings(&mut cues, &transcript.words());
    Ok(cues)
}

/// Rasterize one cue off the async runtime, then upload its frames
/// concurrently. Returned frames keep timeline order.
async fn render_and_upload(
    ctx: &RunContext<'_>,
    renderer: &CaptionRenderer,
    cue: &CaptionCue,
    style: &CaptionStyle,
) -> Result<Vec<UploadedFrame>, PipelineError> {
    let frames = {
        let renderer = renderer.clone();
        let cue = cue.clone();
        let style = style.clone();
        tokio::task::spawn_blocking(move || renderer.render_cue(&cue, &style)).await??
    };

    let folder = ctx.folder("captions");
    let uploads = frames.into_iter().enumerate().map(|(i, frame)| {
        let options = UploadOptions::new(folder.clone(), MediaKind::Image)
            .with_public_id(format!("caption_{}_{i}", cue.index));
        async move {
            let asset = ctx
                .caps
                .storage
                .upload(
                    UploadSource::Bytes {
                        data: frame.image_bytes,
                        filename: format!("caption_{}_{i}.png", cue.index),
                        content_type: "image/png".into(),
                    },
                    &options,
                )
                .await
                .map_err(|e| PipelineError::provider(Stage::Captions, e))?;
            Ok::<_, PipelineError>(UploadedFrame {
                storage_id: asset.id,
                url: asset.url,
                timestamp: frame.timestamp,
                duration: frame.duration,
            })
        }
    });
    try_join_all(uploads).await
}
