//! Background music selection and gain conversion.

use serde::{Deserialize, Serialize};

/// Smallest gain the compositor accepts (silence), in percent.
pub const MIN_GAIN_PERCENT: i32 = -100;

/// Largest gain the compositor accepts, in percent.
pub const MAX_GAIN_PERCENT: i32 = 400;

/// Default music level under the narration, in decibels.
pub const DEFAULT_MUSIC_VOLUME_DB: f64 = -18.0;

/// Where the resolved background track came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicSource {
    Generated,
    Library,
    Custom,
}

impl MusicSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Library => "library",
            Self::Custom => "custom",
        }
    }
}

/// The owner's saved music choice.
///
/// Selected tracks are looked up at run time; a miss falls through to the
/// next tier (custom, then library, then generated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MusicPreference {
    Generated,
    Library {
        #[serde(rename = "trackId")]
        track_id: i64,
    },
    Custom {
        #[serde(rename = "uploadId")]
        upload_id: i64,
        #[serde(rename = "fallbackTrackId", default)]
        fallback_track_id: Option<i64>,
    },
}

impl Default for MusicPreference {
    fn default() -> Self {
        Self::Generated
    }
}

/// Convert a decibel level to the compositor's percent-gain unit.
///
/// `0 dB` is unchanged volume (0%), `-6 dB` roughly halves amplitude
/// (about -50%). The result is clamped to the accepted range.
pub fn db_to_gain_percent(db: f64) -> i32 {
    if !db.is_finite() {
        return 0;
    }
    let ratio = 10f64.powf(db / 20.0);
    let percent = ((ratio - 1.0) * 100.0).round();
    (percent as i64).clamp(MIN_GAIN_PERCENT as i64, MAX_GAIN_PERCENT as i64) as i32
}

/// How many extra repetitions a track needs to cover `video_seconds`.
pub fn loops_needed(track_seconds: Option<f64>, video_seconds: f64) -> u32 {
    match track_seconds {
        Some(t) if t > 0.0 && video_seconds > t => ((video_seconds / t).ceil() as u32).saturating_sub(1),
        _ => 0,
    }
}
