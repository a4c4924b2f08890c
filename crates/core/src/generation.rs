//! Stage outputs carried through one pipeline run.

use serde::{Deserialize, Serialize};

use crate::motion::MotionPrompt;
use crate::music::MusicSource;

/// Output of clip synthesis for one photo group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipResult {
    pub slot_index: usize,
    pub source_image_urls: Vec<String>,
    pub is_keyframe_pair: bool,
    pub motion_prompt: MotionPrompt,
    pub clip_url: String,
    pub mood: String,
    pub description: String,
}

/// Output of the audio stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioResult {
    pub voiceover_script: String,
    pub voiceover_url: String,
    pub music_url: String,
    pub music_source: MusicSource,
    #[serde(default)]
    pub music_duration_seconds: Option<f64>,
}
