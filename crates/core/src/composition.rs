//! Timeline descriptions for the remote compositor.
//!
//! A [`Composition`] is a declarative, serializable timeline: tracks of
//! clips, each referencing a source URL with timing, gain and placement.
//! Building one is pure; rendering it happens remotely via
//! [`Compositor::materialize`](crate::capabilities::Compositor::materialize).

use serde::{Deserialize, Serialize};

use crate::music::db_to_gain_percent;

/// Output frame width for vertical video.
pub const FRAME_WIDTH: u32 = 1080;

/// Output frame height for vertical video.
pub const FRAME_HEIGHT: u32 = 1920;

/// Smallest logo width, as a fraction of frame width.
const MIN_LOGO_SIZE: f64 = 0.05;

/// Largest logo width, as a fraction of frame width.
const MAX_LOGO_SIZE: f64 = 0.5;

/// Logo inset from the frame edge, as a fraction of frame width.
const LOGO_MARGIN: f64 = 0.04;

// ---------------------------------------------------------------------------
// Timeline types
// ---------------------------------------------------------------------------

/// A complete render request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub width: u32,
    pub height: u32,
    pub output: OutputFormat,
    /// Tracks are layered in order: later tracks draw over earlier ones.
    pub tracks: Vec<Track>,
}

impl Composition {
    /// Latest end time across all visual tracks.
    pub fn duration(&self) -> f64 {
        self.tracks
            .iter()
            .filter(|t| t.kind != TrackKind::Audio)
            .flat_map(|t| t.clips.iter())
            .map(|c| c.start + c.duration.unwrap_or(0.0))
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFormat {
    pub container: String,
    pub video_codec: String,
    pub audio_codec: String,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            container: "mp4".into(),
            video_codec: "h264".into(),
            audio_codec: "aac".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Overlay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub kind: TrackKind,
    pub clips: Vec<TimelineClip>,
}

/// One source placed on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineClip {
    pub src: String,
    /// Start on the output timeline, in seconds.
    pub start: f64,
    /// Length on the output timeline; `None` plays the source to its end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Gain relative to the source, in percent (0 = unchanged).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_percent: Option<i32>,
    /// Extra repetitions after the first play.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loops: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
}

impl TimelineClip {
    fn new(src: impl Into<String>, start: f64) -> Self {
        Self {
            src: src.into(),
            start,
            duration: None,
            volume_percent: None,
            loops: None,
            placement: None,
        }
    }
}

/// Pixel rectangle of an overlay on the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    /// `None` keeps the source aspect ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

// ---------------------------------------------------------------------------
// Logo
// ---------------------------------------------------------------------------

/// Frame corner a logo is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoPosition {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogoOverlay {
    pub url: String,
    pub position: LogoPosition,
    /// Logo width as a fraction of frame width.
    pub size: f64,
}

impl LogoOverlay {
    /// Pixel placement on a `width` x `height` frame. Logos are treated as
    /// square for bottom anchoring.
    fn placement(&self, width: u32, height: u32) -> Placement {
        let size = self.size.clamp(MIN_LOGO_SIZE, MAX_LOGO_SIZE);
        let logo_w = (width as f64 * size).round() as i32;
        let margin = (width as f64 * LOGO_MARGIN).round() as i32;
        let (w, h) = (width as i32, height as i32);
        let (x, y) = match self.position {
            LogoPosition::TopLeft => (margin, margin),
            LogoPosition::TopRight => (w - margin - logo_w, margin),
            LogoPosition::BottomLeft => (margin, h - margin - logo_w),
            LogoPosition::BottomRight => (w - margin - logo_w, h - margin - logo_w),
        };
        Placement {
            x,
            y,
            width: logo_w.max(1) as u32,
            height: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Everything the assembly stage combines into the base video.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyInput {
    /// Clip URLs in slot order.
    pub clip_urls: Vec<String>,
    pub clip_seconds: f64,
    pub voiceover_url: String,
    pub music_url: String,
    pub music_volume_db: f64,
    pub music_duration_seconds: Option<f64>,
    pub logo: Option<LogoOverlay>,
}

/// Build the base video: clips back to back, looped music under the
/// full-volume voiceover, optional logo on top.
pub fn build_assembly(input: &AssemblyInput) -> Composition {
    let total = input.clip_seconds * input.clip_urls.len() as f64;

    let video = Track {
        kind: TrackKind::Video,
        clips: input
            .clip_urls
            .iter()
            .enumerate()
            .map(|(i, url)| TimelineClip {
                duration: Some(input.clip_seconds),
                ..TimelineClip::new(url, i as f64 * input.clip_seconds)
            })
            .collect(),
    };

    let loops = crate::music::loops_needed(input.music_duration_seconds, total);
    let music = Track {
        kind: TrackKind::Audio,
        clips: vec![TimelineClip {
            duration: Some(total),
            volume_percent: Some(db_to_gain_percent(input.music_volume_db)),
            loops: (loops > 0).then_some(loops),
            ..TimelineClip::new(&input.music_url, 0.0)
        }],
    };

    let voiceover = Track {
        kind: TrackKind::Audio,
        clips: vec![TimelineClip::new(&input.voiceover_url, 0.0)],
    };

    let mut tracks = vec![video, music, voiceover];

    if let Some(logo) = &input.logo {
        tracks.push(Track {
            kind: TrackKind::Overlay,
            clips: vec![TimelineClip {
                duration: Some(total),
                placement: Some(logo.placement(FRAME_WIDTH, FRAME_HEIGHT)),
                ..TimelineClip::new(&logo.url, 0.0)
            }],
        });
    }

    Composition {
        width: FRAME_WIDTH,
        height: FRAME_HEIGHT,
        output: OutputFormat::default(),
        tracks,
    }
}

/// A rendered caption frame already uploaded to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFrame {
    pub storage_id: String,
    pub url: String,
    pub timestamp: f64,
    pub duration: f64,
}

/// Overlay every caption frame, full-frame, at its own time window over
/// the assembled base video.
pub fn build_caption_overlay(base_video_url: &str, frames: &[UploadedFrame]) -> Composition {
    let base = Track {
        kind: TrackKind::Video,
        clips: vec![TimelineClip::new(base_video_url, 0.0)],
    };
    let overlay = Track {
        kind: TrackKind::Overlay,
        clips: frames
            .iter()
            .map(|f| TimelineClip {
                duration: Some(f.duration),
                placement: Some(Placement {
                    x: 0,
                    y: 0,
                    width: FRAME_WIDTH,
                    height: Some(FRAME_HEIGHT),
                }),
                ..TimelineClip::new(&f.url, f.timestamp)
            })
            .collect(),
    };
    Composition {
        width: FRAME_WIDTH,
        height: FRAME_HEIGHT,
        output: OutputFormat::default(),
        tracks: vec![base, overlay],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AssemblyInput {
        AssemblyInput {
            clip_urls: vec!["https://cdn/a.mp4".into(), "https://cdn/b.mp4".into()],
            clip_seconds: 5.0,
            voiceover_url: "https://cdn/vo.mp3".into(),
            music_url: "https://cdn/music.mp3".into(),
            music_volume_db: -6.0,
            music_duration_seconds: Some(4.0),
            logo: None,
        }
    }

    #[test]
    fn clips_are_sequential_in_order() {
        let comp = build_assembly(&input());
        let video = &comp.tracks[0];
        assert_eq!(video.kind, TrackKind::Video);
        assert_eq!(video.clips[0].src, "https://cdn/a.mp4");
        assert_eq!(video.clips[1].src, "https://cdn/b.mp4");
        assert_eq!(video.clips[1].start, 5.0);
        assert_eq!(comp.duration(), 10.0);
    }

    #[test]
    fn music_is_attenuated_and_looped() {
        let comp = build_assembly(&input());
        let music = &comp.tracks[1].clips[0];
        assert_eq!(music.src, "https://cdn/music.mp3");
        assert_eq!(music.volume_percent, Some(-50));
        assert_eq!(music.loops, Some(2));
    }

    #[test]
    fn voiceover_plays_at_full_volume() {
        let comp = build_assembly(&input());
        let vo = &comp.tracks[2].clips[0];
        assert_eq!(vo.src, "https://cdn/vo.mp3");
        assert_eq!(vo.volume_percent, None);
    }

    #[test]
    fn logo_pinned_to_corner() {
        let mut inp = input();
        inp.logo = Some(LogoOverlay {
            url: "https://cdn/logo.png".into(),
            position: LogoPosition::BottomRight,
            size: 0.2,
        });
        let comp = build_assembly(&inp);
        let logo = &comp.tracks[3];
        assert_eq!(logo.kind, TrackKind::Overlay);
        let placement = logo.clips[0].placement.unwrap();
        assert_eq!(placement.width, 216);
        assert_eq!(placement.x, 1080 - 43 - 216);
    }

    #[test]
    fn assembly_is_deterministic() {
        assert_eq!(build_assembly(&input()), build_assembly(&input()));
    }

    #[test]
    fn caption_overlay_times_each_frame() {
        let frames = vec![
            UploadedFrame {
                storage_id: "f1".into(),
                url: "https://cdn/f1.png".into(),
                timestamp: 0.5,
                duration: 0.04,
            },
            UploadedFrame {
                storage_id: "f2".into(),
                url: "https://cdn/f2.png".into(),
                timestamp: 0.54,
                duration: 1.2,
            },
        ];
        let comp = build_caption_overlay("https://cdn/base.mp4", &frames);
        assert_eq!(comp.tracks[0].clips[0].src, "https://cdn/base.mp4");
        let overlay = &comp.tracks[1].clips;
        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay[1].start, 0.54);
        assert_eq!(overlay[1].duration, Some(1.2));
    }

    #[test]
    fn serializes_camel_case_without_empty_fields() {
        let json = serde_json::to_value(build_assembly(&input())).unwrap();
        let first = &json["tracks"][0]["clips"][0];
        assert!(first.get("volumePercent").is_none());
        assert_eq!(json["output"]["videoCodec"], "h264");
    }
}
