//! Pipeline stages, in run order.

pub mod assembly;
pub mod audio;
pub mod captions;
pub mod clips;

use reel_core::types::{DbId, VideoId};

use crate::capabilities::Capabilities;
use crate::config::PipelineConfig;

/// What every stage of one run needs.
pub struct RunContext<'a> {
    pub video_id: VideoId,
    pub owner_id: DbId,
    pub caps: &'a Capabilities,
    pub config: &'a PipelineConfig,
}

impl RunContext<'_> {
    /// Storage folder for this run's assets of one kind.
    pub fn folder(&self, kind: &str) -> String {
        format!("reels/{}/{kind}", self.video_id)
    }
}
