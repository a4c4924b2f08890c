//! Per-owner generation settings, snapshotted when a pipeline run starts.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::captions::CaptionStyle;
use crate::composition::{LogoOverlay, LogoPosition};
use crate::music::{MusicPreference, DEFAULT_MUSIC_VOLUME_DB};

/// Voice used when the owner has not chosen one.
pub const DEFAULT_VOICE: &str = "nova";

/// Default logo width as a fraction of frame width.
pub const DEFAULT_LOGO_SIZE: f64 = 0.15;

/// Stored settings are parsed one key at a time: a malformed value only
/// resets that key to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct OwnerSettings {
    pub voice: String,
    /// Free-text delivery instructions for speech synthesis.
    pub voice_style: Option<String>,
    pub music: MusicPreference,
    pub music_volume_db: f64,
    pub captions_enabled: bool,
    pub caption_style: CaptionStyle,
    pub logo: Option<LogoSettings>,
}

impl Default for OwnerSettings {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.into(),
            voice_style: None,
            music: MusicPreference::default(),
            music_volume_db: DEFAULT_MUSIC_VOLUME_DB,
            captions_enabled: true,
            caption_style: CaptionStyle::default(),
            logo: None,
        }
    }
}

impl From<Map<String, Value>> for OwnerSettings {
    fn from(mut raw: Map<String, Value>) -> Self {
        let mut settings = Self::default();
        merge_field(&mut raw, "voice", &mut settings.voice);
        merge_field(&mut raw, "voiceStyle", &mut settings.voice_style);
        merge_field(&mut raw, "music", &mut settings.music);
        merge_field(&mut raw, "musicVolumeDb", &mut settings.music_volume_db);
        merge_field(&mut raw, "captionsEnabled", &mut settings.captions_enabled);
        merge_field(&mut raw, "captionStyle", &mut settings.caption_style);
        merge_field(&mut raw, "logo", &mut settings.logo);
        settings
    }
}

impl OwnerSettings {
    /// Parse a stored settings document. Anything that is not an object
    /// yields the defaults rather than blocking generation.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(raw) => raw.into(),
            Value::Null => Self::default(),
            other => {
                tracing::warn!(kind = json_kind(&other), "Owner settings are not an object, using defaults");
                Self::default()
            }
        }
    }
}

/// Overwrite `slot` with the value stored under `key`, if present and
/// well-formed. A malformed value is logged and leaves `slot` untouched.
pub(crate) fn merge_field<T: DeserializeOwned>(raw: &mut Map<String, Value>, key: &'static str, slot: &mut T) {
    let Some(value) = raw.remove(key) else {
        return;
    };
    match serde_json::from_value(value) {
        Ok(parsed) => *slot = parsed,
        Err(e) => tracing::warn!(key, error = %e, "Malformed setting, using default"),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoSettings {
    pub url: String,
    #[serde(default)]
    pub position: LogoPosition,
    #[serde(default = "default_logo_size")]
    pub size: f64,
}

fn default_logo_size() -> f64 {
    DEFAULT_LOGO_SIZE
}

impl From<&LogoSettings> for LogoOverlay {
    fn from(logo: &LogoSettings) -> Self {
        Self {
            url: logo.url.clone(),
            position: logo.position,
            size: logo.size,
        }
    }
}
