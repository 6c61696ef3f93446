//! Centralized configuration for Reelkit.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::path::PathBuf;
use std::time::Duration;

/// Central configuration for all Reelkit components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct ReelkitConfig {
    pub transcoding: TranscodingConfig,
    pub playback: PlaybackConfig,
    pub storage: StorageConfig,
}

/// Transcoding pipeline configuration.
///
/// Controls the external encoding engine invocation, job concurrency,
/// and thumbnail extraction parameters.
#[derive(Debug, Clone)]
pub struct TranscodingConfig {
    /// Maximum number of transcode jobs running concurrently.
    /// Presets within one job always encode sequentially.
    pub max_concurrent_jobs: usize,
    /// Per-preset encode timeout
    pub encode_timeout: Duration,
    /// Keyframe interval in frames (closed GOP)
    pub gop_size: u32,
    /// Minimum keyframe interval in frames
    pub min_keyframe_interval: u32,
    /// Speed/efficiency tradeoff passed to the encoder
    pub encoder_speed_preset: &'static str,
    /// Default timestamp offset for thumbnail extraction
    pub thumbnail_offset: Duration,
    /// Thumbnail output dimensions (portrait, matching the rendition ladder)
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
}

impl Default for TranscodingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: num_cpus::get().min(4),
            encode_timeout: Duration::from_secs(600), // 10 minutes per preset
            gop_size: 60,
            min_keyframe_interval: 30,
            encoder_speed_preset: "medium",
            thumbnail_offset: Duration::from_secs(1),
            thumbnail_width: 720,
            thumbnail_height: 1280,
        }
    }
}

/// Client-side adaptive playback configuration.
///
/// Thresholds for the buffering heuristics and the cadence of the
/// quality evaluation tick.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Interval between quality evaluations
    pub evaluation_interval: Duration,
    /// Minimum playback time before the buffering-count rule applies
    pub reduce_min_playback: Duration,
    /// Buffering events at or above this count trigger a reduction
    pub reduce_buffering_count: u32,
    /// Minimum playback time before the buffering-ratio rule applies
    pub ratio_min_playback: Duration,
    /// Buffering ratio above this triggers a reduction
    pub reduce_buffering_ratio: f64,
    /// Minimum playback time before an increase is considered
    pub increase_min_playback: Duration,
    /// Buffering events at or below this count allow an increase
    pub increase_max_buffering_count: u32,
    /// Buffering ratio below this allows an increase
    pub increase_max_buffering_ratio: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            evaluation_interval: Duration::from_secs(15),
            reduce_min_playback: Duration::from_secs(20),
            reduce_buffering_count: 3,
            ratio_min_playback: Duration::from_secs(10),
            reduce_buffering_ratio: 0.25,
            increase_min_playback: Duration::from_secs(60),
            increase_max_buffering_count: 1,
            increase_max_buffering_ratio: 0.05,
        }
    }
}

/// Rendition storage and URL layout configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory where rendition files are written
    pub output_dir: PathBuf,
    /// Public URL prefix under which renditions are served
    pub url_prefix: &'static str,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("uploads/videos"),
            url_prefix: "/uploads/videos",
        }
    }
}

impl ReelkitConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(jobs) = std::env::var("REELKIT_MAX_JOBS") {
            if let Ok(count) = jobs.parse::<usize>() {
                config.transcoding.max_concurrent_jobs = count.max(1);
            }
        }

        if let Ok(timeout) = std::env::var("REELKIT_ENCODE_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.transcoding.encode_timeout = Duration::from_secs(seconds);
            }
        }

        if let Ok(interval) = std::env::var("REELKIT_EVAL_INTERVAL") {
            if let Ok(seconds) = interval.parse::<u64>() {
                config.playback.evaluation_interval = Duration::from_secs(seconds);
            }
        }

        if let Ok(dir) = std::env::var("REELKIT_OUTPUT_DIR") {
            config.storage.output_dir = PathBuf::from(dir);
        }

        config
    }
}
