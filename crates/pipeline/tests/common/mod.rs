//! In-process capability fakes and fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use reel_core::capabilities::{
    AssetRef, ClipRequest, Compositor, GeneratedTrack, MediaStorage, MusicGenerator, MusicRequest,
    ProviderError, RemoteJob, ScriptWriter, SpeechSynthesizer, Transcriber, Transcript,
    TranscriptCorrector, UploadOptions, UploadSource, VideoSynthesizer, VisionAnalyzer,
    VoiceSettings,
};
use reel_core::captions::font::BlockGlyphs;
use reel_core::composition::Composition;
use reel_core::motion::RawVisionAnalysis;
use reel_core::polling::PollConfig;
use reel_core::property::{PhotoGroupMode, PropertyDetails};
use reel_core::types::{DbId, VideoId};
use reel_pipeline::capabilities::CaptionFonts;
use reel_pipeline::request::{GenerationPayload, PhotoGroup, UploadSpool};
use reel_pipeline::{Capabilities, MemoryStatusStore, Orchestrator, PipelineConfig};

pub const OWNER: DbId = 7;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeStorage {
    pub uploads: Mutex<Vec<UploadOptions>>,
}

impl FakeStorage {
    pub fn count_in(&self, folder_suffix: &str) -> usize {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.folder.ends_with(folder_suffix))
            .count()
    }
}

#[async_trait]
impl MediaStorage for FakeStorage {
    async fn upload(&self, _source: UploadSource, options: &UploadOptions) -> Result<AssetRef, ProviderError> {
        let mut uploads = self.uploads.lock().unwrap();
        let name = options
            .public_id
            .clone()
            .unwrap_or_else(|| format!("asset{}", uploads.len()));
        uploads.push(options.clone());
        let id = format!("{}/{name}", options.folder);
        Ok(AssetRef {
            url: format!("https://cdn.test/{id}"),
            id,
        })
    }
}

// ---------------------------------------------------------------------------
// Vision and clips
// ---------------------------------------------------------------------------

pub struct FakeVision {
    pub motion: String,
    pub calls: AtomicUsize,
}

impl Default for FakeVision {
    fn default() -> Self {
        Self {
            motion: "Push In".into(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VisionAnalyzer for FakeVision {
    async fn analyze(&self, image_urls: &[String], _instructions: &str) -> Result<RawVisionAnalysis, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawVisionAnalysis {
            is_keyframe: image_urls.len() == 2,
            description: format!("Room shown in {}", image_urls.len()),
            motion_prompt: self.motion.clone(),
            mood: "bright".into(),
        })
    }
}

/// Clip synthesis that finishes after `pending_polls` pending checks.
/// Submitting a start image containing `fail_marker` makes that job fail.
#[derive(Default)]
pub struct FakeVideo {
    pub requests: Mutex<Vec<ClipRequest>>,
    pub pending_polls: usize,
    pub fail_marker: Option<String>,
    pub never_finishes: bool,
    pub polls: AtomicUsize,
}

impl FakeVideo {
    pub fn submissions(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl VideoSynthesizer for FakeVideo {
    async fn submit(&self, request: &ClipRequest) -> Result<String, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(format!("job{}", requests.len() - 1))
    }

    async fn status(&self, job_id: &str) -> Result<RemoteJob<String>, ProviderError> {
        if self.never_finishes {
            return Ok(RemoteJob::Pending(Some("queued".into())));
        }
        let index: usize = job_id.trim_start_matches("job").parse().unwrap();
        let request = self.requests.lock().unwrap()[index].clone();
        if let Some(marker) = &self.fail_marker {
            if request.start_image_url.contains(marker.as_str()) {
                return Ok(RemoteJob::Failed("content policy".into()));
            }
        }
        if self.polls.fetch_add(1, Ordering::SeqCst) < self.pending_polls {
            return Ok(RemoteJob::Pending(Some("processing".into())));
        }
        Ok(RemoteJob::Succeeded(format!("https://clips.test/{job_id}.mp4")))
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Writes a script sized to the band requested in the prompt. The first
/// `rejections` answers contain numerals.
#[derive(Default)]
pub struct FakeScript {
    pub rejections: usize,
    pub calls: AtomicUsize,
}

#[async_trait]
impl ScriptWriter for FakeScript {
    async fn write(&self, prompt: &str) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.rejections {
            return Ok("Call 555 0100 now".into());
        }
        let min: usize = prompt
            .split("Between ")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|n| n.parse().ok())
            .unwrap_or(10);
        let mut words = vec!["lovely"; min.saturating_sub(3)];
        words.extend(["book", "a", "visit"]);
        Ok(words.join(" "))
    }
}

#[derive(Default)]
pub struct FakeSpeech {
    pub voices: Mutex<Vec<VoiceSettings>>,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, _text: &str, voice: &VoiceSettings) -> Result<Vec<u8>, ProviderError> {
        self.voices.lock().unwrap().push(voice.clone());
        Ok(b"ID3 fake mp3".to_vec())
    }
}

#[derive(Default)]
pub struct FakeMusic {
    pub requests: Mutex<Vec<MusicRequest>>,
    pub fails: bool,
}

impl FakeMusic {
    pub fn submissions(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl MusicGenerator for FakeMusic {
    async fn submit(&self, request: &MusicRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok("track1".into())
    }

    async fn status(&self, job_id: &str) -> Result<RemoteJob<GeneratedTrack>, ProviderError> {
        if self.fails {
            return Ok(RemoteJob::Failed("generation quota exhausted".into()));
        }
        Ok(RemoteJob::Succeeded(GeneratedTrack {
            url: format!("https://music.test/{job_id}.mp3"),
            duration_seconds: Some(30.0),
        }))
    }
}

// ---------------------------------------------------------------------------
// Captions
// ---------------------------------------------------------------------------

pub const TRANSCRIPT_SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nlovely lovely home\n\n\
2\n00:00:02,000 --> 00:00:04,500\nbook a visit\n";

#[derive(Default)]
pub struct FakeTranscriber {
    pub fails: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio_url: &str) -> Result<Transcript, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fails {
            return Err(ProviderError::Api {
                status: 500,
                body: "transcription backend down".into(),
            });
        }
        Ok(Transcript::Srt(TRANSCRIPT_SRT.into()))
    }
}

/// Returns the transcript unchanged.
#[derive(Default)]
pub struct FakeCorrector;

#[async_trait]
impl TranscriptCorrector for FakeCorrector {
    async fn correct(&self, srt: &str, _script: &str) -> Result<String, ProviderError> {
        Ok(srt.to_string())
    }
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCompositor {
    pub compositions: Mutex<Vec<Composition>>,
    pub never_finishes: bool,
}

impl FakeCompositor {
    pub fn renders(&self) -> usize {
        self.compositions.lock().unwrap().len()
    }

    pub fn composition(&self, index: usize) -> Composition {
        self.compositions.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl Compositor for FakeCompositor {
    async fn submit(&self, composition: &Composition) -> Result<String, ProviderError> {
        let mut compositions = self.compositions.lock().unwrap();
        compositions.push(composition.clone());
        Ok(format!("render{}", compositions.len() - 1))
    }

    async fn status(&self, render_id: &str) -> Result<RemoteJob<AssetRef>, ProviderError> {
        if self.never_finishes {
            return Ok(RemoteJob::Pending(Some("rendering".into())));
        }
        Ok(RemoteJob::Succeeded(AssetRef {
            id: render_id.to_string(),
            url: format!("https://render.test/{render_id}.mp4"),
        }))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Every fake, kept so tests can inspect calls after a run.
#[derive(Default)]
pub struct Fakes {
    pub storage: Arc<FakeStorage>,
    pub vision: Arc<FakeVision>,
    pub video: Arc<FakeVideo>,
    pub script: Arc<FakeScript>,
    pub speech: Arc<FakeSpeech>,
    pub music: Arc<FakeMusic>,
    pub transcriber: Arc<FakeTranscriber>,
    pub corrector: Arc<FakeCorrector>,
    pub compositor: Arc<FakeCompositor>,
}

impl Fakes {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            storage: self.storage.clone(),
            vision: self.vision.clone(),
            video: self.video.clone(),
            script: self.script.clone(),
            speech: self.speech.clone(),
            music: self.music.clone(),
            transcriber: self.transcriber.clone(),
            corrector: self.corrector.clone(),
            compositor: self.compositor.clone(),
        }
    }
}

/// Millisecond polling and a small frame so runs finish quickly.
pub fn fast_config(spool_dir: &Path) -> PipelineConfig {
    let fast = PollConfig::new(Duration::from_millis(1), 5);
    PipelineConfig {
        clip_poll: fast,
        music_poll: fast,
        materialize_poll: fast,
        test_clip_urls: vec!["https://placeholder.test/a.mp4".into(), "https://placeholder.test/b.mp4".into()],
        dispatch_interval: Duration::from_millis(5),
        heartbeat_interval: Duration::from_millis(5),
        spool_dir: spool_dir.to_path_buf(),
        frame_width: 108,
        frame_height: 192,
        ..PipelineConfig::default()
    }
}

pub fn orchestrator(fakes: &Fakes, store: Arc<MemoryStatusStore>, spool_dir: &Path) -> Orchestrator {
    Orchestrator::new(
        store.clone(),
        store,
        Arc::new(fakes.capabilities()),
        CaptionFonts::Fixed(Arc::new(BlockGlyphs)),
        UploadSpool::new(spool_dir),
        Arc::new(fast_config(spool_dir)),
    )
}

pub fn property(title: &str) -> PropertyDetails {
    PropertyDetails {
        title: title.into(),
        price: "450000".into(),
        location: "Lisbon".into(),
        beds: Some("2".into()),
        ..PropertyDetails::default()
    }
}

/// Spool the photos for `modes` and build the task payload.
pub async fn payload(
    spool_dir: &Path,
    video_id: VideoId,
    title: &str,
    modes: &[PhotoGroupMode],
) -> GenerationPayload {
    let spool = UploadSpool::new(spool_dir);
    let mut groups = Vec::new();
    for (g, mode) in modes.iter().enumerate() {
        let mut images = Vec::new();
        for i in 0..mode.expected_images() {
            let name = format!("photo_{g}_{i}.jpg");
            images.push(
                spool
                    .store(video_id, g, i, &name, "image/jpeg", b"\xff\xd8fake")
                    .await
                    .unwrap(),
            );
        }
        groups.push(PhotoGroup { mode: *mode, images });
    }
    GenerationPayload {
        owner_id: OWNER,
        property: property(title),
        groups,
    }
}
