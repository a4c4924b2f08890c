//! Assembly: clips, narration, music and logo into the base video.

use reel_core::composition::{build_assembly, AssemblyInput, Composition, LogoOverlay};
use reel_core::generation::{AudioResult, ClipResult};
use reel_core::settings::OwnerSettings;

use super::RunContext;
use crate::error::{PipelineError, Stage};

/// The rendered base video.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledVideo {
    pub url: String,
    pub duration_seconds: f64,
}

/// Composition for the base video. Clips keep their slot order.
pub fn base_composition(
    clip_seconds: u32,
    clips: &[ClipResult],
    audio: &AudioResult,
    settings: &OwnerSettings,
) -> Composition {
    let mut ordered: Vec<&ClipResult> = clips.iter().collect();
    ordered.sort_by_key(|c| c.slot_index);

    build_assembly(&AssemblyInput {
        clip_urls: ordered.iter().map(|c| c.clip_url.clone()).collect(),
        clip_seconds: f64::from(clip_seconds),
        voiceover_url: audio.voiceover_url.clone(),
        music_url: audio.music_url.clone(),
        music_volume_db: settings.music_volume_db,
        music_duration_seconds: audio.music_duration_seconds,
        logo: settings.logo.as_ref().map(LogoOverlay::from),
    })
}

pub async fn assemble(
    ctx: &RunContext<'_>,
    clips: &[ClipResult],
    audio: &AudioResult,
    settings: &OwnerSettings,
) -> Result<AssembledVideo, PipelineError> {
    let composition = base_composition(ctx.config.clip_seconds, clips, audio, settings);
    let duration_seconds = composition.duration();

    let asset = ctx
        .caps
        .compositor
        .materialize(&composition, &ctx.config.materialize_poll)
        .await
        .map_err(|e| PipelineError::provider(Stage::Assembly, e))?;

    tracing::info!(video_id = %ctx.video_id, duration_seconds, url = %asset.url, "Base video assembled");
    Ok(AssembledVideo {
        url: asset.url,
        duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use reel_core::composition::TrackKind;
    use reel_core::motion::MotionPrompt;
    use reel_core::music::MusicSource;
    use reel_core::settings::LogoSettings;

    use super::*;

    fn clip(slot: usize) -> ClipResult {
        ClipResult {
            slot_index: slot,
            source_image_urls: vec![format!("https://cdn/p{slot}.jpg")],
            is_keyframe_pair: false,
            motion_prompt: MotionPrompt::PushIn,
            clip_url: format!("https://cdn/clip{slot}.mp4"),
            mood: "bright".into(),
            description: String::new(),
        }
    }

    fn audio() -> AudioResult {
        AudioResult {
            voiceover_script: "Welcome home.".into(),
            voiceover_url: "https://cdn/vo.mp3".into(),
            music_url: "https://cdn/music.mp3".into(),
            music_source: MusicSource::Library,
            music_duration_seconds: None,
        }
    }

    #[test]
    fn clips_ordered_by_slot() {
        let comp = base_composition(5, &[clip(2), clip(0), clip(1)], &audio(), &OwnerSettings::default());
        let srcs: Vec<&str> = comp.tracks[0].clips.iter().map(|c| c.src.as_str()).collect();
        assert_eq!(
            srcs,
            ["https://cdn/clip0.mp4", "https://cdn/clip1.mp4", "https://cdn/clip2.mp4"]
        );
        assert_eq!(comp.duration(), 15.0);
    }

    #[test]
    fn logo_becomes_overlay_track() {
        let settings = OwnerSettings {
            logo: Some(LogoSettings {
                url: "https://cdn/logo.png".into(),
                position: Default::default(),
                size: 0.2,
            }),
            ..OwnerSettings::default()
        };
        let comp = base_composition(5, &[clip(0)], &audio(), &settings);
        let overlay = comp.tracks.last().unwrap();
        assert_eq!(overlay.kind, TrackKind::Overlay);
        assert_eq!(overlay.clips[0].src, "https://cdn/logo.png");
    }
}
