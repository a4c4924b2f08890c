//! External capability seams.
//!
//! The pipeline talks to AI providers, object storage and the remote
//! compositor only through these traits. Concrete HTTP clients live in
//! `reel-providers`; tests substitute in-process fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::captions::WordTiming;
use crate::composition::Composition;
use crate::motion::RawVisionAnalysis;
use crate::polling::{poll_until, PollConfig, PollError, PollState};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure reported by (or while talking to) an external capability.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport-level failure: DNS, TLS, connection reset, body read.
    #[error("Provider request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success HTTP status.
    #[error("Provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The provider answered, but not in the shape we require.
    #[error("Provider response did not match the expected schema: {0}")]
    Schema(String),

    /// The provider accepted the job and then reported it failed.
    #[error("Provider job failed: {0}")]
    Failed(String),

    /// A remote job did not finish within its polling budget.
    #[error("Provider job timed out: {0}")]
    Timeout(String),
}

impl From<PollError<ProviderError>> for ProviderError {
    fn from(err: PollError<ProviderError>) -> Self {
        match err {
            PollError::Failed(inner) => inner,
            exhausted @ PollError::Exhausted { .. } => Self::Timeout(exhausted.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared value types
// ---------------------------------------------------------------------------

/// A stored asset: provider-side identifier plus its delivery URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub id: String,
    pub url: String,
}

/// Broad media class of an upload, used for storage routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// What to upload.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Raw bytes held in memory.
    Bytes {
        data: Vec<u8>,
        filename: String,
        content_type: String,
    },
    /// A remote URL the storage service fetches itself.
    Url(String),
}

/// Where and as what to store an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder: String,
    pub kind: MediaKind,
    /// Explicit public id; the storage service picks one when absent.
    pub public_id: Option<String>,
}

impl UploadOptions {
    pub fn new(folder: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            folder: folder.into(),
            kind,
            public_id: None,
        }
    }

    pub fn with_public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = Some(public_id.into());
        self
    }
}

/// Status of a long-running remote job.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteJob<T> {
    /// Queued or running; carries the provider's status text if any.
    Pending(Option<String>),
    Succeeded(T),
    Failed(String),
}

impl<T> RemoteJob<T> {
    /// Convert into a single polling step: failure ends polling with an error.
    pub fn into_poll_state(self) -> Result<PollState<T>, ProviderError> {
        match self {
            Self::Pending(status) => Ok(PollState::Pending(status)),
            Self::Succeeded(value) => Ok(PollState::Ready(value)),
            Self::Failed(reason) => Err(ProviderError::Failed(reason)),
        }
    }
}

/// Inputs for one camera-motion clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    pub prompt: String,
    pub start_image_url: String,
    /// Present for keyframe pairs.
    pub end_image_url: Option<String>,
    pub duration_seconds: u32,
}

/// Narration voice selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoiceSettings {
    pub voice: String,
    /// Free-text delivery instructions ("warm, upbeat").
    pub instructions: Option<String>,
}

/// Inputs for a generated background track.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicRequest {
    pub prompt: String,
    pub duration_seconds: u32,
    pub instrumental: bool,
}

/// A finished generated track.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTrack {
    pub url: String,
    pub duration_seconds: Option<f64>,
}

/// One timed segment of a transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub words: Vec<WordTiming>,
}

/// Speech-to-text output, resolved to one of the shapes providers return.
#[derive(Debug, Clone, PartialEq)]
pub enum Transcript {
    /// Subtitle text in SRT format.
    Srt(String),
    /// Timed segments, optionally with word timings.
    Segments(Vec<TranscriptSegment>),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Object storage with public delivery URLs.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn upload(
        &self,
        source: UploadSource,
        options: &UploadOptions,
    ) -> Result<AssetRef, ProviderError>;
}

/// Image understanding for clip planning.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Analyse one image or a start/end keyframe pair under `instructions`.
    async fn analyze(
        &self,
        image_urls: &[String],
        instructions: &str,
    ) -> Result<RawVisionAnalysis, ProviderError>;
}

/// Image-to-video synthesis.
#[async_trait]
pub trait VideoSynthesizer: Send + Sync {
    /// Submit a job and return the provider's job id.
    async fn submit(&self, request: &ClipRequest) -> Result<String, ProviderError>;

    /// Current status; success carries the clip URL.
    async fn status(&self, job_id: &str) -> Result<RemoteJob<String>, ProviderError>;
}

/// Free-text generation used for narration scripts.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    async fn write(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Text-to-speech. Returns encoded audio (mp3).
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &VoiceSettings) -> Result<Vec<u8>, ProviderError>;
}

/// Background-music generation.
#[async_trait]
pub trait MusicGenerator: Send + Sync {
    async fn submit(&self, request: &MusicRequest) -> Result<String, ProviderError>;
    async fn status(&self, job_id: &str) -> Result<RemoteJob<GeneratedTrack>, ProviderError>;
}

/// Speech-to-text over a stored audio asset.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_url: &str) -> Result<Transcript, ProviderError>;
}

/// Fixes transcription errors against the known script.
///
/// Implementations must keep the cue count and timings of `srt` intact and
/// only change cue text.
#[async_trait]
pub trait TranscriptCorrector: Send + Sync {
    async fn correct(&self, srt: &str, script: &str) -> Result<String, ProviderError>;
}

/// Remote media compositor that renders a [`Composition`] into a video.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Queue a render and return its id.
    async fn submit(&self, composition: &Composition) -> Result<String, ProviderError>;

    async fn status(&self, render_id: &str) -> Result<RemoteJob<AssetRef>, ProviderError>;

    /// Submit `composition` and wait until the output asset exists.
    ///
    /// Running out of attempts yields [`ProviderError::Timeout`].
    async fn materialize(
        &self,
        composition: &Composition,
        poll: &PollConfig,
    ) -> Result<AssetRef, ProviderError> {
        let render_id = self.submit(composition).await?;
        let render_id = render_id.as_str();
        let asset = poll_until(poll, "composition", move |_| async move {
            self.status(render_id).await?.into_poll_state()
        })
        .await?;
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn exhausted_poll_maps_to_timeout() {
        let err: ProviderError = PollError::<ProviderError>::Exhausted {
            attempts: 3,
            last_status: "rendering".into(),
        }
        .into();
        assert_matches!(err, ProviderError::Timeout(msg) if msg.contains("3 attempts"));
    }

    #[test]
    fn failed_remote_job_ends_polling() {
        let job: RemoteJob<String> = RemoteJob::Failed("content policy".into());
        assert_matches!(job.into_poll_state(), Err(ProviderError::Failed(reason)) if reason == "content policy");
    }

    #[test]
    fn upload_options_builder() {
        let opts = UploadOptions::new("reels/abc", MediaKind::Audio).with_public_id("voiceover");
        assert_eq!(opts.public_id.as_deref(), Some("voiceover"));
        assert_eq!(opts.kind.as_str(), "audio");
    }
}
