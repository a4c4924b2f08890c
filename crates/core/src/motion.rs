//! Camera-motion vocabulary for clip synthesis.
//!
//! The vision-analysis capability must answer with exactly one of the
//! tokens in [`MotionPrompt::ALL`]. Anything else is a schema violation and
//! is rejected by [`VisionAnalysis::validate`] rather than passed through to
//! the video synthesizer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Enumerated camera motions understood by the video synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MotionPrompt {
    Static,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    PushIn,
    PullOut,
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    OrbitLeft,
    OrbitRight,
    CraneUp,
    CraneDown,
}

impl MotionPrompt {
    pub const ALL: [MotionPrompt; 15] = [
        Self::Static,
        Self::MoveLeft,
        Self::MoveRight,
        Self::MoveUp,
        Self::MoveDown,
        Self::PushIn,
        Self::PullOut,
        Self::ZoomIn,
        Self::ZoomOut,
        Self::PanLeft,
        Self::PanRight,
        Self::OrbitLeft,
        Self::OrbitRight,
        Self::CraneUp,
        Self::CraneDown,
    ];

    /// Canonical token, as sent to the synthesizer.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "Static",
            Self::MoveLeft => "Move Left",
            Self::MoveRight => "Move Right",
            Self::MoveUp => "Move Up",
            Self::MoveDown => "Move Down",
            Self::PushIn => "Push In",
            Self::PullOut => "Pull Out",
            Self::ZoomIn => "Zoom In",
            Self::ZoomOut => "Zoom Out",
            Self::PanLeft => "Pan Left",
            Self::PanRight => "Pan Right",
            Self::OrbitLeft => "Orbit Left",
            Self::OrbitRight => "Orbit Right",
            Self::CraneUp => "Crane Up",
            Self::CraneDown => "Crane Down",
        }
    }
}

impl fmt::Display for MotionPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a motion token is outside the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown camera motion '{0}'")]
pub struct UnknownMotion(pub String);

impl FromStr for MotionPrompt {
    type Err = UnknownMotion;

    /// Matching is case-insensitive and tolerant of surrounding whitespace,
    /// but the words themselves must match a token exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| UnknownMotion(s.to_string()))
    }
}

impl TryFrom<String> for MotionPrompt {
    type Error = UnknownMotion;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MotionPrompt> for String {
    fn from(value: MotionPrompt) -> Self {
        value.as_str().to_string()
    }
}

/// Build the fixed instruction sent with every vision-analysis request.
pub fn analysis_instructions(keyframe_pair: bool) -> String {
    let tokens = MotionPrompt::ALL
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let subject = if keyframe_pair {
        "The two images are the START and END keyframes of one shot of a property listing."
    } else {
        "The image is a single photo of a property listing."
    };
    format!(
        "{subject} Describe the space in one sentence, pick the single camera motion that best \
         presents it, and name its mood in one or two words. Respond with a JSON object \
         {{\"isKeyframe\": bool, \"description\": string, \"motionPrompt\": string, \"mood\": string}}. \
         motionPrompt MUST be exactly one of: {tokens}."
    )
}

/// Raw answer from the vision-analysis capability, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawVisionAnalysis {
    #[serde(default)]
    pub is_keyframe: bool,
    #[serde(default)]
    pub description: String,
    pub motion_prompt: String,
    #[serde(default)]
    pub mood: String,
}

/// A validated vision analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionAnalysis {
    pub is_keyframe: bool,
    pub description: String,
    pub motion_prompt: MotionPrompt,
    pub mood: String,
}

impl VisionAnalysis {
    /// Validate a raw answer, rejecting any motion outside the vocabulary.
    pub fn validate(raw: RawVisionAnalysis) -> Result<Self, UnknownMotion> {
        let motion_prompt = raw.motion_prompt.parse()?;
        Ok(Self {
            is_keyframe: raw.is_keyframe,
            description: raw.description.trim().to_string(),
            motion_prompt,
            mood: raw.mood.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_token() {
        for motion in MotionPrompt::ALL {
            assert_eq!(motion.as_str().parse::<MotionPrompt>().unwrap(), motion);
        }
    }

    #[test]
    fn parse_is_case_and_space_tolerant() {
        assert_eq!(" push   in ".parse::<MotionPrompt>().unwrap(), MotionPrompt::PushIn);
    }

    #[test]
    fn rejects_unknown_motion() {
        assert!("Dolly Zoom".parse::<MotionPrompt>().is_err());
        assert!("Push".parse::<MotionPrompt>().is_err());
    }

    #[test]
    fn validate_rejects_out_of_vocabulary() {
        let raw = RawVisionAnalysis {
            is_keyframe: false,
            description: "A kitchen".into(),
            motion_prompt: "Slow cinematic drift".into(),
            mood: "warm".into(),
        };
        assert!(VisionAnalysis::validate(raw).is_err());
    }

    #[test]
    fn serde_round_trips_token_text() {
        let json = serde_json::to_string(&MotionPrompt::OrbitRight).unwrap();
        assert_eq!(json, "\"Orbit Right\"");
        let back: MotionPrompt = serde_json::from_str("\"crane down\"").unwrap();
        assert_eq!(back, MotionPrompt::CraneDown);
    }

    #[test]
    fn instructions_list_all_tokens() {
        let text = analysis_instructions(true);
        for motion in MotionPrompt::ALL {
            assert!(text.contains(motion.as_str()));
        }
        assert!(text.contains("START and END"));
    }
}
