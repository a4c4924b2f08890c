//! The set of external capabilities one pipeline run uses.

use std::sync::Arc;

use reel_core::capabilities::{
    Compositor, MediaStorage, MusicGenerator, ScriptWriter, SpeechSynthesizer, Transcriber,
    TranscriptCorrector, VideoSynthesizer, VisionAnalyzer,
};
use reel_core::captions::font::{FontDirectory, GlyphSource};
use reel_core::captions::CaptionError;
use reel_providers::{
    CloudStorage, MusicClient, OpenAiClient, ProviderConfig, RenderClient, VideoSynthesisClient,
};

/// Trait objects for every capability, cheap to clone.
#[derive(Clone)]
pub struct Capabilities {
    pub storage: Arc<dyn MediaStorage>,
    pub vision: Arc<dyn VisionAnalyzer>,
    pub video: Arc<dyn VideoSynthesizer>,
    pub script: Arc<dyn ScriptWriter>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub music: Arc<dyn MusicGenerator>,
    pub transcriber: Arc<dyn Transcriber>,
    pub corrector: Arc<dyn TranscriptCorrector>,
    pub compositor: Arc<dyn Compositor>,
}

impl Capabilities {
    /// Production wiring: HTTP clients sharing one connection pool.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, reqwest::Error> {
        let http = config.http_client()?;
        let openai = Arc::new(OpenAiClient::new(http.clone(), config));
        Ok(Self {
            storage: Arc::new(CloudStorage::new(http.clone(), config)),
            vision: openai.clone(),
            video: Arc::new(VideoSynthesisClient::new(http.clone(), config)),
            script: openai.clone(),
            speech: openai.clone(),
            music: Arc::new(MusicClient::new(http.clone(), config)),
            transcriber: openai.clone(),
            corrector: openai,
            compositor: Arc::new(RenderClient::new(http, config)),
        })
    }
}

/// Where caption glyphs come from.
#[derive(Clone)]
pub enum CaptionFonts {
    /// `{Family}-{Face}.ttf` files on disk, resolved per style.
    Directory(FontDirectory),
    /// One glyph source for every style.
    Fixed(Arc<dyn GlyphSource>),
}

impl CaptionFonts {
    pub fn load(&self, family: &str, weight: u16) -> Result<Arc<dyn GlyphSource>, CaptionError> {
        match self {
            Self::Directory(dir) => Ok(Arc::new(dir.load_stack(family, weight)?)),
            Self::Fixed(glyphs) => Ok(glyphs.clone()),
        }
    }
}
