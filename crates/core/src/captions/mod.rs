//! Burned-in caption pipeline: cue parsing, text shaping, frame planning,
//! layout, and rasterization to transparent PNG overlays.
//!
//! The flow for a single cue is:
//!
//! 1. [`text::prepare`] applies uppercase and emoji augmentation.
//! 2. [`timing::split_words`] optionally breaks the cue into one-word cues.
//! 3. [`animation::plan_frames`] decides how many frames to draw and when.
//! 4. [`layout::layout_text`] wraps the text once at full size.
//! 5. [`render::CaptionRenderer`] draws each planned frame.

pub mod animation;
pub mod emoji;
pub mod font;
pub mod layout;
pub mod render;
pub mod srt;
pub mod style;
pub mod text;
pub mod timing;

use serde::{Deserialize, Serialize};

pub use render::CaptionRenderer;
pub use style::CaptionStyle;

/// Timing of a single spoken word, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    #[serde(alias = "word")]
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// One subtitle cue. `start_time < end_time` always holds for parsed cues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionCue {
    pub index: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<WordTiming>>,
}

impl CaptionCue {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// A rendered overlay frame. Exists only between rendering and upload.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionFrame {
    /// Transparent PNG.
    pub image_bytes: Vec<u8>,
    /// Start on the video timeline, in seconds.
    pub timestamp: f64,
    pub duration: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum CaptionError {
    #[error("Font error: {0}")]
    Font(String),

    #[error("Font file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
