//! Audio: narration script, voiceover, and background music.

use reel_core::capabilities::{
    MediaKind, MusicRequest, ProviderError, UploadOptions, UploadSource, VoiceSettings,
};
use reel_core::generation::{AudioResult, ClipResult};
use reel_core::music::{MusicPreference, MusicSource};
use reel_core::polling::poll_until;
use reel_core::property::PropertyDetails;
use reel_core::script::{narration_prompt, validate_script, WordBand};
use reel_core::settings::OwnerSettings;

use super::RunContext;
use crate::error::{PipelineError, Stage};
use crate::store::{MusicCatalog, MusicTrack};

/// A background track and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMusic {
    pub url: String,
    pub source: MusicSource,
    pub duration_seconds: Option<f64>,
}

pub async fn synthesize_audio(
    ctx: &RunContext<'_>,
    catalog: &dyn MusicCatalog,
    property: &PropertyDetails,
    settings: &OwnerSettings,
    clips: &[ClipResult],
) -> Result<AudioResult, PipelineError> {
    let video_seconds = ctx.config.video_seconds(clips.len());
    let script = write_script(ctx, property, clips, video_seconds).await?;

    let (voiceover_url, music) = tokio::try_join!(
        voiceover(ctx, &script, settings),
        resolve_music(ctx, catalog, &settings.music, clips, video_seconds),
    )?;

    tracing::info!(
        video_id = %ctx.video_id,
        music_source = music.source.as_str(),
        words = script.split_whitespace().count(),
        "Audio ready"
    );

    Ok(AudioResult {
        voiceover_script: script,
        voiceover_url,
        music_url: music.url,
        music_source: music.source,
        music_duration_seconds: music.duration_seconds,
    })
}

/// Generate a narration that passes structural validation, retrying a
/// rejected script up to the configured attempt count.
pub async fn write_script(
    ctx: &RunContext<'_>,
    property: &PropertyDetails,
    clips: &[ClipResult],
    video_seconds: f64,
) -> Result<String, PipelineError> {
    let band = WordBand::for_duration(video_seconds);
    let scenes: Vec<String> = clips.iter().map(|c| c.description.clone()).collect();
    let prompt = narration_prompt(property, band, &scenes);
    let attempts = ctx.config.script_attempts.max(1);

    let mut last_rejection = None;
    for attempt in 1..=attempts {
        let script = ctx
            .caps
            .script
            .write(&prompt)
            .await
            .map_err(|e| PipelineError::provider(Stage::Audio, e))?;
        match validate_script(&script, band) {
            Ok(()) => return Ok(script.trim().to_string()),
            Err(rejection) => {
                tracing::warn!(video_id = %ctx.video_id, attempt, reason = %rejection, "Narration script rejected");
                last_rejection = Some(rejection);
            }
        }
    }

    let reason = last_rejection.map_or_else(String::new, |r| r.to_string());
    Err(PipelineError::schema(
        Stage::Audio,
        format!("no acceptable script after {attempts} attempts ({reason})"),
    ))
}

/// Speak the script and store the audio.
async fn voiceover(
    ctx: &RunContext<'_>,
    script: &str,
    settings: &OwnerSettings,
) -> Result<String, PipelineError> {
    let voice = VoiceSettings {
        voice: settings.voice.clone(),
        instructions: settings.voice_style.clone(),
    };
    let audio = ctx
        .caps
        .speech
        .synthesize(script, &voice)
        .await
        .map_err(|e| PipelineError::provider(Stage::Audio, e))?;

    let options = UploadOptions::new(ctx.folder("audio"), MediaKind::Audio).with_public_id("voiceover");
    let asset = ctx
        .caps
        .storage
        .upload(
            UploadSource::Bytes {
                data: audio,
                filename: "voiceover.mp3".into(),
                content_type: "audio/mpeg".into(),
            },
            &options,
        )
        .await
        .map_err(|e| PipelineError::provider(Stage::Audio, e))?;
    Ok(asset.url)
}

/// Walk the fallback chain: custom upload, then library track, then a
/// generated track. Lookup misses, lookup errors and custom tracks longer
/// than the configured cap fall through; a generation failure is fatal.
pub async fn resolve_music(
    ctx: &RunContext<'_>,
    catalog: &dyn MusicCatalog,
    preference: &MusicPreference,
    clips: &[ClipResult],
    video_seconds: f64,
) -> Result<ResolvedMusic, PipelineError> {
    let library_choice = match preference {
        MusicPreference::Custom {
            upload_id,
            fallback_track_id,
        } => {
            let found = lookup(ctx, "custom", catalog.custom_upload(*upload_id, ctx.owner_id).await);
            let cap = f64::from(ctx.config.custom_music_max_seconds);
            match found {
                Some(track) if track.duration_seconds.is_some_and(|d| d > cap) => {
                    tracing::warn!(
                        video_id = %ctx.video_id,
                        upload_id,
                        duration = ?track.duration_seconds,
                        cap,
                        "Custom track exceeds duration cap, falling back"
                    );
                }
                Some(track) => return Ok(resolved(track, MusicSource::Custom)),
                None => {}
            }
            *fallback_track_id
        }
        MusicPreference::Library { track_id } => Some(*track_id),
        MusicPreference::Generated => None,
    };

    if let Some(track_id) = library_choice {
        if let Some(track) = lookup(ctx, "library", catalog.library_track(track_id).await) {
            return Ok(resolved(track, MusicSource::Library));
        }
    }

    generate_music(ctx, clips, video_seconds).await
}

fn lookup(
    ctx: &RunContext<'_>,
    tier: &str,
    result: Result<Option<MusicTrack>, crate::store::StoreError>,
) -> Option<MusicTrack> {
    match result {
        Ok(Some(track)) => Some(track),
        Ok(None) => {
            tracing::info!(video_id = %ctx.video_id, tier, "Selected music not found, falling back");
            None
        }
        Err(e) => {
            tracing::warn!(video_id = %ctx.video_id, tier, error = %e, "Music lookup failed, falling back");
            None
        }
    }
}

fn resolved(track: MusicTrack, source: MusicSource) -> ResolvedMusic {
    ResolvedMusic {
        url: track.url,
        source,
        duration_seconds: track.duration_seconds,
    }
}

async fn generate_music(
    ctx: &RunContext<'_>,
    clips: &[ClipResult],
    video_seconds: f64,
) -> Result<ResolvedMusic, PipelineError> {
    let duration = (video_seconds.ceil() as u32)
        .clamp(ctx.config.music_min_seconds, ctx.config.music_max_seconds.max(ctx.config.music_min_seconds));
    let request = MusicRequest {
        prompt: music_prompt(clips),
        duration_seconds: duration,
        instrumental: true,
    };

    let generator = ctx.caps.music.as_ref();
    let job_id = generator
        .submit(&request)
        .await
        .map_err(|e| PipelineError::provider(Stage::Audio, e))?;
    let job = job_id.as_str();
    let track = poll_until(&ctx.config.music_poll, "music", move |_| async move {
        generator.status(job).await?.into_poll_state()
    })
    .await
    .map_err(|e| PipelineError::provider(Stage::Audio, ProviderError::from(e)))?;

    Ok(ResolvedMusic {
        url: track.url,
        source: MusicSource::Generated,
        duration_seconds: track.duration_seconds,
    })
}

/// Describe the wanted track from the moods the clips were tagged with.
pub fn music_prompt(clips: &[ClipResult]) -> String {
    let mut moods: Vec<&str> = Vec::new();
    for clip in clips {
        let mood = clip.mood.trim();
        if !mood.is_empty() && !moods.iter().any(|m| m.eq_ignore_ascii_case(mood)) {
            moods.push(mood);
        }
    }
    let mood = if moods.is_empty() {
        "warm, inviting".to_string()
    } else {
        moods.join(", ")
    };
    format!("Instrumental background music for a real-estate property tour. Mood: {mood}. No vocals.")
}
