//! Frame planning: how many overlay frames a cue needs and what each shows.

use super::style::CaptionAnimation;
use super::timing::word_windows;
use super::CaptionCue;

/// Length of the entrance burst for `pop` and `fade`, in seconds.
pub const BURST_SECONDS: f64 = 0.2;

/// Frames drawn during the entrance burst.
pub const BURST_FRAMES: usize = 5;

/// Starting scale of the `pop` entrance.
pub const POP_START_SCALE: f32 = 0.8;

/// Opacity of words not yet spoken in `karaoke` mode.
pub const UPCOMING_WORD_OPACITY: f32 = 0.45;

/// One planned overlay frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSpec {
    /// Absolute start on the video timeline, in seconds.
    pub timestamp: f64,
    pub duration: f64,
    /// Text scale relative to the full font size.
    pub scale: f32,
    /// Whole-frame opacity multiplier.
    pub opacity: f32,
    /// Karaoke only: number of leading words drawn as spoken.
    pub spoken_words: Option<usize>,
}

impl FrameSpec {
    fn still(timestamp: f64, duration: f64) -> Self {
        Self {
            timestamp,
            duration,
            scale: 1.0,
            opacity: 1.0,
            spoken_words: None,
        }
    }
}

/// Plan the frames for `cue`. Frame durations always sum to the cue duration.
pub fn plan_frames(cue: &CaptionCue, animation: CaptionAnimation) -> Vec<FrameSpec> {
    let duration = cue.duration();
    if duration <= 0.0 {
        return Vec::new();
    }

    match animation {
        CaptionAnimation::None => vec![FrameSpec::still(cue.start_time, duration)],
        CaptionAnimation::Pop | CaptionAnimation::Fade => burst(cue, animation),
        CaptionAnimation::Karaoke => karaoke(cue),
    }
}

fn burst(cue: &CaptionCue, animation: CaptionAnimation) -> Vec<FrameSpec> {
    let duration = cue.duration();
    let burst = BURST_SECONDS.min(duration / 2.0);
    let step = burst / BURST_FRAMES as f64;

    let mut frames: Vec<FrameSpec> = (0..BURST_FRAMES)
        .map(|i| {
            let progress = i as f32 / (BURST_FRAMES - 1) as f32;
            let (scale, opacity) = match animation {
                CaptionAnimation::Pop => (POP_START_SCALE + (1.0 - POP_START_SCALE) * progress, 1.0),
                _ => (1.0, progress),
            };
            FrameSpec {
                timestamp: cue.start_time + step * i as f64,
                duration: step,
                scale,
                opacity,
                spoken_words: None,
            }
        })
        .collect();

    frames.push(FrameSpec::still(cue.start_time + burst, duration - burst));
    frames
}

fn karaoke(cue: &CaptionCue) -> Vec<FrameSpec> {
    word_windows(cue)
        .into_iter()
        .enumerate()
        .filter(|(_, (start, end))| end > start)
        .map(|(i, (start, end))| FrameSpec {
            spoken_words: Some(i + 1),
            ..FrameSpec::still(start, end - start)
        })
        .collect()
}
