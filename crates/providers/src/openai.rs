//! Client for an OpenAI-compatible API.
//!
//! One client serves five capabilities: vision analysis and script writing
//! (chat completions), transcript correction (chat completions), speech
//! synthesis (`/audio/speech`) and transcription (`/audio/transcriptions`).

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use serde_json::json;

use reel_core::capabilities::{
    ProviderError, ScriptWriter, SpeechSynthesizer, Transcriber, Transcript, TranscriptCorrector,
    TranscriptSegment, VisionAnalyzer, VoiceSettings,
};
use reel_core::captions::{srt, WordTiming};
use reel_core::motion::RawVisionAnalysis;

use crate::config::ProviderConfig;
use crate::http::{endpoint, parse_response, read_bytes, read_text, request_error, send};

/// Instructions for the transcript correction pass.
const CORRECTION_INSTRUCTIONS: &str = "You fix speech-to-text errors in SRT subtitles. \
You receive the SRT and the exact script that was spoken. Correct misheard words so the \
subtitle text matches the script. Keep every cue, every index and every timestamp exactly \
as given; change only the text lines. Answer with the corrected SRT only.";

/// System message for narration scripts.
const SCRIPT_SYSTEM_PROMPT: &str =
    "You write concise, warm voiceovers for real-estate listing videos.";

#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    vision_model: String,
    script_model: String,
    speech_model: String,
    transcription_model: String,
    transcription_format: TranscriptionFormat,
}

/// Response format requested from the transcription endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionFormat {
    VerboseJson,
    Srt,
}

impl TranscriptionFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::VerboseJson => "verbose_json",
            Self::Srt => "srt",
        }
    }
}

impl OpenAiClient {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        let transcription_format = match config.transcription_format.as_str() {
            "srt" => TranscriptionFormat::Srt,
            _ => TranscriptionFormat::VerboseJson,
        };
        Self {
            client,
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            vision_model: config.vision_model.clone(),
            script_model: config.script_model.clone(),
            speech_model: config.speech_model.clone(),
            transcription_model: config.transcription_model.clone(),
            transcription_format,
        }
    }

    /// Run one chat completion and return the first choice's text.
    async fn chat(&self, body: serde_json::Value) -> Result<String, ProviderError> {
        let response = send(
            self.client
                .post(endpoint(&self.base_url, "chat/completions"))
                .bearer_auth(&self.api_key)
                .json(&body),
        )
        .await?;
        let completion: ChatCompletion = parse_response(response).await?;
        completion.into_text()
    }

    async fn fetch_audio(&self, audio_url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = send(self.client.get(audio_url)).await?;
        read_bytes(response).await
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletion {
    fn into_text(self) -> Result<String, ProviderError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::Schema("completion has no text content".into()))
    }
}

/// `verbose_json` transcription body.
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    segments: Vec<VerboseSegment>,
    #[serde(default)]
    words: Vec<WordTiming>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Resolve a `verbose_json` body into segments, assigning each word to the
/// segment containing its midpoint.
fn segments_from_verbose(body: VerboseTranscription) -> Transcript {
    let segments = body
        .segments
        .into_iter()
        .map(|seg| {
            let words = body
                .words
                .iter()
                .filter(|w| {
                    let mid = (w.start + w.end) / 2.0;
                    mid >= seg.start && mid < seg.end
                })
                .cloned()
                .collect();
            TranscriptSegment {
                start: seg.start,
                end: seg.end,
                text: seg.text.trim().to_string(),
                words,
            }
        })
        .collect();
    Transcript::Segments(segments)
}

/// Strip a Markdown code fence the model sometimes wraps around its answer.
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().trim_end_matches("```").trim()
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

#[async_trait]
impl VisionAnalyzer for OpenAiClient {
    async fn analyze(
        &self,
        image_urls: &[String],
        instructions: &str,
    ) -> Result<RawVisionAnalysis, ProviderError> {
        let mut content = vec![json!({"type": "text", "text": instructions})];
        content.extend(
            image_urls
                .iter()
                .map(|url| json!({"type": "image_url", "image_url": {"url": url}})),
        );
        let body = json!({
            "model": self.vision_model,
            "response_format": {"type": "json_object"},
            "messages": [{"role": "user", "content": content}],
        });

        let text = self.chat(body).await?;
        serde_json::from_str(strip_fence(&text))
            .map_err(|e| ProviderError::Schema(format!("vision analysis: {e}")))
    }
}

#[async_trait]
impl ScriptWriter for OpenAiClient {
    async fn write(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.script_model,
            "messages": [
                {"role": "system", "content": SCRIPT_SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
        });
        self.chat(body).await
    }
}

#[async_trait]
impl TranscriptCorrector for OpenAiClient {
    async fn correct(&self, srt_text: &str, script: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.script_model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": CORRECTION_INSTRUCTIONS},
                {"role": "user", "content": format!("SCRIPT:\n{script}\n\nSRT:\n{srt_text}")},
            ],
        });
        let corrected = self.chat(body).await?;
        let corrected = strip_fence(&corrected).to_string();

        let before = srt::parse(srt_text).len();
        let after = srt::parse(&corrected).len();
        if before != after {
            return Err(ProviderError::Schema(format!(
                "corrected transcript has {after} cues, expected {before}"
            )));
        }
        Ok(corrected)
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiClient {
    async fn synthesize(&self, text: &str, voice: &VoiceSettings) -> Result<Vec<u8>, ProviderError> {
        let mut body = json!({
            "model": self.speech_model,
            "input": text,
            "voice": voice.voice,
            "response_format": "mp3",
        });
        if let Some(instructions) = voice.instructions.as_deref().filter(|s| !s.trim().is_empty()) {
            body["instructions"] = json!(instructions);
        }

        let response = send(
            self.client
                .post(endpoint(&self.base_url, "audio/speech"))
                .bearer_auth(&self.api_key)
                .json(&body),
        )
        .await?;
        let audio = read_bytes(response).await?;
        if audio.is_empty() {
            return Err(ProviderError::Schema("speech synthesis returned no audio".into()));
        }
        Ok(audio)
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, audio_url: &str) -> Result<Transcript, ProviderError> {
        let audio = self.fetch_audio(audio_url).await?;
        let part = multipart::Part::bytes(audio)
            .file_name("voiceover.mp3")
            .mime_str("audio/mpeg")
            .map_err(request_error)?;

        let mut form = multipart::Form::new()
            .part("file", part)
            .text("model", self.transcription_model.clone())
            .text("response_format", self.transcription_format.as_str());
        if self.transcription_format == TranscriptionFormat::VerboseJson {
            form = form
                .text("timestamp_granularities[]", "segment")
                .text("timestamp_granularities[]", "word");
        }

        let response = send(
            self.client
                .post(endpoint(&self.base_url, "audio/transcriptions"))
                .bearer_auth(&self.api_key)
                .multipart(form),
        )
        .await?;

        match self.transcription_format {
            TranscriptionFormat::Srt => Ok(Transcript::Srt(read_text(response).await?)),
            TranscriptionFormat::VerboseJson => {
                let body: VerboseTranscription = parse_response(response).await?;
                Ok(segments_from_verbose(body))
            }
        }
    }
}
