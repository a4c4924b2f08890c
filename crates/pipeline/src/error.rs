//! Pipeline error type and the stage a failure belongs to.

use std::fmt;

use reel_core::capabilities::ProviderError;
use reel_core::captions::CaptionError;

use crate::store::StoreError;

/// Pipeline stage, used to label failures and log spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clips,
    Audio,
    Assembly,
    Captions,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clips => "clips",
            Self::Audio => "audio",
            Self::Assembly => "assembly",
            Self::Captions => "captions",
        }
    }

    /// Human-readable prefix for the job's error text.
    fn label(self) -> &'static str {
        match self {
            Self::Clips => "Clip synthesis failed",
            Self::Audio => "Audio generation failed",
            Self::Assembly => "Video assembly failed",
            Self::Captions => "Captioning failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// An external capability failed.
    #[error("{}: {source}", .stage.label())]
    Provider {
        stage: Stage,
        #[source]
        source: ProviderError,
    },

    /// A remote job or render did not finish within its polling budget.
    #[error("{}: timed out ({message})", .stage.label())]
    Timeout { stage: Stage, message: String },

    /// A capability answered with something structurally unusable.
    #[error("{}: {message}", .stage.label())]
    Schema { stage: Stage, message: String },

    #[error("Status store error: {0}")]
    Store(#[from] StoreError),

    #[error("Caption rendering failed: {0}")]
    Render(#[from] CaptionError),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Upload spool error: {0}")]
    Spool(#[from] std::io::Error),

    #[error("Failed to encode generation record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// Attribute a capability failure to `stage`. Timeouts and schema
    /// violations get their own variants.
    pub fn provider(stage: Stage, source: ProviderError) -> Self {
        match source {
            ProviderError::Timeout(message) => Self::Timeout { stage, message },
            ProviderError::Schema(message) => Self::Schema { stage, message },
            source => Self::Provider { stage, source },
        }
    }

    pub fn schema(stage: Stage, message: impl Into<String>) -> Self {
        Self::Schema {
            stage,
            message: message.into(),
        }
    }

    /// Stage the failure belongs to, when it has one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Provider { stage, .. } | Self::Timeout { stage, .. } | Self::Schema { stage, .. } => {
                Some(*stage)
            }
            Self::Render(_) => Some(Stage::Captions),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn provider_timeout_becomes_timeout() {
        let err = PipelineError::provider(Stage::Clips, ProviderError::Timeout("60 attempts".into()));
        assert_matches!(err, PipelineError::Timeout { stage: Stage::Clips, .. });
        assert!(err.to_string().starts_with("Clip synthesis failed: timed out"));
    }

    #[test]
    fn provider_failure_keeps_reason() {
        let err = PipelineError::provider(Stage::Clips, ProviderError::Failed("content policy".into()));
        assert!(err.to_string().contains("content policy"));
        assert_eq!(err.stage(), Some(Stage::Clips));
    }
}
