//! Pipeline tuning loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use reel_core::composition::{FRAME_HEIGHT, FRAME_WIDTH};
use reel_core::polling::PollConfig;

/// Default polling for clip synthesis: every 10 s, at most 60 checks.
pub const DEFAULT_CLIP_POLL: PollConfig = PollConfig::new(Duration::from_secs(10), 60);

/// Default polling for music generation.
pub const DEFAULT_MUSIC_POLL: PollConfig = PollConfig::new(Duration::from_secs(10), 30);

/// Default polling for remote composition renders.
pub const DEFAULT_MATERIALIZE_POLL: PollConfig = PollConfig::new(Duration::from_secs(5), 120);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub clip_poll: PollConfig,
    /// Length of every synthesized clip, in seconds.
    pub clip_seconds: u32,
    /// Placeholder clips used round-robin for `[TEST]` titles.
    pub test_clip_urls: Vec<String>,
    pub music_poll: PollConfig,
    pub music_min_seconds: u32,
    pub music_max_seconds: u32,
    /// Longest custom upload used as-is; longer tracks fall through.
    pub custom_music_max_seconds: u32,
    pub materialize_poll: PollConfig,
    /// Generation attempts for a narration script before giving up.
    pub script_attempts: u32,
    /// Pipelines run at the same time by one dispatcher.
    pub max_concurrency: usize,
    pub dispatch_interval: Duration,
    pub heartbeat_interval: Duration,
    /// Claimed jobs silent for longer than this are failed by the watchdog.
    pub stale_after: Duration,
    pub watchdog_interval: Duration,
    pub font_dir: PathBuf,
    pub spool_dir: PathBuf,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clip_poll: DEFAULT_CLIP_POLL,
            clip_seconds: 5,
            test_clip_urls: Vec::new(),
            music_poll: DEFAULT_MUSIC_POLL,
            music_min_seconds: 10,
            music_max_seconds: 120,
            custom_music_max_seconds: 600,
            materialize_poll: DEFAULT_MATERIALIZE_POLL,
            script_attempts: 3,
            max_concurrency: 4,
            dispatch_interval: Duration::from_secs(2),
            heartbeat_interval: Duration::from_secs(30),
            stale_after: Duration::from_secs(1800),
            watchdog_interval: Duration::from_secs(60),
            font_dir: PathBuf::from("assets/fonts"),
            spool_dir: PathBuf::from("data/spool"),
            frame_width: FRAME_WIDTH,
            frame_height: FRAME_HEIGHT,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default        |
    /// |----------------------------------|----------------|
    /// | `CLIP_POLL_INTERVAL_SECS`        | `10`           |
    /// | `CLIP_POLL_MAX_ATTEMPTS`         | `60`           |
    /// | `CLIP_SECONDS`                   | `5`            |
    /// | `TEST_CLIP_URLS`                 | (empty)        |
    /// | `MUSIC_POLL_INTERVAL_SECS`       | `10`           |
    /// | `MUSIC_POLL_MAX_ATTEMPTS`        | `30`           |
    /// | `MUSIC_MIN_SECONDS`              | `10`           |
    /// | `MUSIC_MAX_SECONDS`              | `120`          |
    /// | `CUSTOM_MUSIC_MAX_SECONDS`       | `600`          |
    /// | `MATERIALIZE_POLL_INTERVAL_SECS` | `5`            |
    /// | `MATERIALIZE_POLL_MAX_ATTEMPTS`  | `120`          |
    /// | `SCRIPT_ATTEMPTS`                | `3`            |
    /// | `PIPELINE_MAX_CONCURRENCY`       | `4`            |
    /// | `PIPELINE_DISPATCH_INTERVAL_SECS`| `2`            |
    /// | `PIPELINE_HEARTBEAT_SECS`        | `30`           |
    /// | `PIPELINE_STALE_AFTER_SECS`      | `1800`         |
    /// | `PIPELINE_WATCHDOG_INTERVAL_SECS`| `60`           |
    /// | `CAPTION_FONT_DIR`               | `assets/fonts` |
    /// | `UPLOAD_SPOOL_DIR`               | `data/spool`   |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let poll = |interval_var: &str, attempts_var: &str, fallback: PollConfig| {
            PollConfig::new(
                Duration::from_secs(env_or(interval_var, fallback.interval.as_secs())),
                env_or(attempts_var, fallback.max_attempts),
            )
        };

        let test_clip_urls = std::env::var("TEST_CLIP_URLS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            clip_poll: poll("CLIP_POLL_INTERVAL_SECS", "CLIP_POLL_MAX_ATTEMPTS", defaults.clip_poll),
            clip_seconds: env_or("CLIP_SECONDS", defaults.clip_seconds),
            test_clip_urls,
            music_poll: poll("MUSIC_POLL_INTERVAL_SECS", "MUSIC_POLL_MAX_ATTEMPTS", defaults.music_poll),
            music_min_seconds: env_or("MUSIC_MIN_SECONDS", defaults.music_min_seconds),
            music_max_seconds: env_or("MUSIC_MAX_SECONDS", defaults.music_max_seconds),
            custom_music_max_seconds: env_or("CUSTOM_MUSIC_MAX_SECONDS", defaults.custom_music_max_seconds),
            materialize_poll: poll(
                "MATERIALIZE_POLL_INTERVAL_SECS",
                "MATERIALIZE_POLL_MAX_ATTEMPTS",
                defaults.materialize_poll,
            ),
            script_attempts: env_or("SCRIPT_ATTEMPTS", defaults.script_attempts),
            max_concurrency: env_or("PIPELINE_MAX_CONCURRENCY", defaults.max_concurrency).max(1),
            dispatch_interval: Duration::from_secs(env_or(
                "PIPELINE_DISPATCH_INTERVAL_SECS",
                defaults.dispatch_interval.as_secs(),
            )),
            heartbeat_interval: Duration::from_secs(env_or(
                "PIPELINE_HEARTBEAT_SECS",
                defaults.heartbeat_interval.as_secs(),
            )),
            stale_after: Duration::from_secs(env_or(
                "PIPELINE_STALE_AFTER_SECS",
                defaults.stale_after.as_secs(),
            )),
            watchdog_interval: Duration::from_secs(env_or(
                "PIPELINE_WATCHDOG_INTERVAL_SECS",
                defaults.watchdog_interval.as_secs(),
            )),
            font_dir: std::env::var("CAPTION_FONT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.font_dir),
            spool_dir: std::env::var("UPLOAD_SPOOL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.spool_dir),
            frame_width: defaults.frame_width,
            frame_height: defaults.frame_height,
        }
    }

    /// Target video length in seconds for `clip_count` clips.
    pub fn video_seconds(&self, clip_count: usize) -> f64 {
        f64::from(self.clip_seconds) * clip_count as f64
    }
}

/// Parse an environment variable, panicking on a malformed value so a bad
/// deployment fails at startup.
fn env_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.clip_poll.interval, Duration::from_secs(10));
        assert_eq!(config.clip_poll.max_attempts, 60);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.stale_after, Duration::from_secs(1800));
    }

    #[test]
    fn video_seconds_scales_with_clips() {
        assert_eq!(PipelineConfig::default().video_seconds(5), 25.0);
    }
}
