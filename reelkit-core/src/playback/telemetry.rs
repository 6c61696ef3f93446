//! Playback telemetry for buffering detection
//!
//! Consumes player status ticks and derives buffering-event count and
//! cumulative buffering duration since the last reset. The monitor must be
//! reset at session start and immediately after any quality change, so the
//! decision engine always evaluates fresh evidence.
//!
//! Every public operation delegates to an `*_at` variant taking an explicit
//! `Instant`, which keeps the buffering-interval arithmetic deterministic in
//! tests. Status processing assumes monotonic, non-overlapping timestamps.

use std::time::{Duration, Instant};

use crate::config::PlaybackConfig;

/// One player status tick from the playback surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerStatus {
    pub is_buffering: bool,
    pub is_loaded: bool,
}

/// Snapshot of the current session's buffering behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryStats {
    pub playback_duration: Duration,
    pub buffering_count: u32,
    /// Includes an in-flight buffering interval up to the snapshot time
    pub total_buffering: Duration,
    pub buffering_ratio: f64,
}

/// Verdict from one telemetry evaluation.
///
/// `should_reduce` and `should_increase` are mutually exclusive by
/// construction of the thresholds; both false is the stable state.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryVerdict {
    pub should_reduce: bool,
    pub should_increase: bool,
    pub stats: TelemetryStats,
}

/// Tracks one playback session's buffering behavior
#[derive(Debug)]
pub struct PlaybackTelemetryMonitor {
    config: PlaybackConfig,
    session_start: Instant,
    buffering_count: u32,
    buffering_started: Option<Instant>,
    total_buffering: Duration,
    currently_buffering: bool,
}

impl PlaybackTelemetryMonitor {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            session_start: Instant::now(),
            buffering_count: 0,
            buffering_started: None,
            total_buffering: Duration::ZERO,
            currently_buffering: false,
        }
    }

    /// Clear all counters and restart the session clock
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.session_start = now;
        self.buffering_count = 0;
        self.buffering_started = None;
        self.total_buffering = Duration::ZERO;
        self.currently_buffering = false;
    }

    /// Process one player status tick
    pub fn on_status(&mut self, status: PlayerStatus) {
        self.on_status_at(status, Instant::now());
    }

    pub fn on_status_at(&mut self, status: PlayerStatus, now: Instant) {
        // Ticks before the player has loaded carry no buffering signal
        if !status.is_loaded {
            return;
        }

        match (self.currently_buffering, status.is_buffering) {
            (false, true) => {
                self.buffering_count += 1;
                self.buffering_started = Some(now);
                self.currently_buffering = true;
            }
            (true, false) => {
                if let Some(started) = self.buffering_started.take() {
                    self.total_buffering += now.saturating_duration_since(started);
                }
                self.currently_buffering = false;
            }
            // Repeated identical states never double count
            (true, true) | (false, false) => {}
        }
    }

    /// Snapshot the session stats as of `now`
    pub fn stats_at(&self, now: Instant) -> TelemetryStats {
        let playback_duration = now.saturating_duration_since(self.session_start);

        let mut total_buffering = self.total_buffering;
        if let Some(started) = self.buffering_started {
            total_buffering += now.saturating_duration_since(started);
        }

        let buffering_ratio = if playback_duration.is_zero() {
            0.0
        } else {
            total_buffering.as_secs_f64() / playback_duration.as_secs_f64()
        };

        TelemetryStats {
            playback_duration,
            buffering_count: self.buffering_count,
            total_buffering,
            buffering_ratio,
        }
    }

    /// Evaluate the session against the reduce/increase thresholds
    pub fn analyze(&self) -> TelemetryVerdict {
        self.analyze_at(Instant::now())
    }

    pub fn analyze_at(&self, now: Instant) -> TelemetryVerdict {
        let stats = self.stats_at(now);
        let (should_reduce, should_increase) = evaluate(&self.config, &stats);

        TelemetryVerdict {
            should_reduce,
            should_increase,
            stats,
        }
    }
}

/// Threshold rules shared by analyze() and the property tests
fn evaluate(config: &PlaybackConfig, stats: &TelemetryStats) -> (bool, bool) {
    let should_reduce = (stats.playback_duration > config.reduce_min_playback
        && stats.buffering_count >= config.reduce_buffering_count)
        || (stats.playback_duration > config.ratio_min_playback
            && stats.buffering_ratio > config.reduce_buffering_ratio);

    let should_increase = stats.playback_duration > config.increase_min_playback
        && stats.buffering_count <= config.increase_max_buffering_count
        && stats.buffering_ratio < config.increase_max_buffering_ratio;

    (should_reduce, should_increase)
}
