//! Narration script rules: length band, prompt, and structural validation.
//!
//! The text-generation capability is trusted for facts; only length and
//! structure are checked here.

use crate::property::PropertyDetails;

/// Lower bound of the narration pace, in words per second of video.
pub const WORDS_PER_SECOND_MIN: f64 = 2.0;

/// Upper bound of the narration pace, in words per second of video.
pub const WORDS_PER_SECOND_MAX: f64 = 2.6;

/// Relative slack applied to the band when validating a generated script.
pub const WORD_BAND_TOLERANCE: f64 = 0.25;

/// Inclusive word-count range a script should fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordBand {
    pub min: usize,
    pub max: usize,
}

impl WordBand {
    /// Band for a video of `target_seconds`.
    pub fn for_duration(target_seconds: f64) -> Self {
        let secs = target_seconds.max(1.0);
        Self {
            min: (secs * WORDS_PER_SECOND_MIN).round() as usize,
            max: (secs * WORDS_PER_SECOND_MAX).round() as usize,
        }
    }

    /// Whether `count` is inside the band widened by [`WORD_BAND_TOLERANCE`].
    pub fn accepts(&self, count: usize) -> bool {
        let lo = (self.min as f64 * (1.0 - WORD_BAND_TOLERANCE)).floor() as usize;
        let hi = (self.max as f64 * (1.0 + WORD_BAND_TOLERANCE)).ceil() as usize;
        (lo..=hi).contains(&count)
    }
}

/// Why a generated script was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptRejection {
    #[error("script is empty")]
    Empty,
    #[error("script contains numerals; numbers must be spelled out")]
    ContainsNumerals,
    #[error("script has {count} words, expected {min}-{max}")]
    WrongLength { count: usize, min: usize, max: usize },
}

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Structural validation of a generated narration.
pub fn validate_script(script: &str, band: WordBand) -> Result<(), ScriptRejection> {
    let trimmed = script.trim();
    if trimmed.is_empty() {
        return Err(ScriptRejection::Empty);
    }
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        return Err(ScriptRejection::ContainsNumerals);
    }
    let count = word_count(trimmed);
    if !band.accepts(count) {
        return Err(ScriptRejection::WrongLength {
            count,
            min: band.min,
            max: band.max,
        });
    }
    Ok(())
}

/// Build the narration instructions for the text-generation capability.
pub fn narration_prompt(property: &PropertyDetails, band: WordBand, scene_notes: &[String]) -> String {
    let scenes = scene_notes
        .iter()
        .enumerate()
        .map(|(i, note)| format!("{}. {note}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Write the voiceover for a short vertical real-estate video.\n\
         Rules:\n\
         - Between {min} and {max} words.\n\
         - Spell out every number in words; never use digits.\n\
         - Use only the facts listed below; do not invent features.\n\
         - End with a clear call to action inviting the viewer to book a visit.\n\
         - Plain text only, no stage directions.\n\n\
         Facts:\n{facts}\n\n\
         Scenes in order:\n{scenes}",
        min = band.min,
        max = band.max,
        facts = property.fact_sheet(),
    )
}
