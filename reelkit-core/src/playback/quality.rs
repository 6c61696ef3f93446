//! Hysteresis-based quality decision engine
//!
//! Owns the long-lived current quality tier and revises it from telemetry on
//! a periodic evaluation tick. Transitions are always a single step, the
//! telemetry monitor is reset after every change, and for an increase at
//! least a full minute of accumulated playback must build up again, so the
//! tier can never oscillate within one tick.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::telemetry::{PlaybackTelemetryMonitor, PlayerStatus, TelemetryVerdict};
use crate::config::PlaybackConfig;
use crate::encoding::presets::QualityLevel;

/// Quality-change notification callback
pub type QualityChangeFn = Arc<dyn Fn(QualityLevel) + Send + Sync>;

/// Why the engine moved to a new tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    /// Telemetry showed sustained buffering
    Reduced,
    /// Telemetry showed sustained smooth playback
    Increased,
    /// Explicit user choice
    ManualOverride,
}

struct EngineState {
    quality: Mutex<QualityLevel>,
    monitor: Mutex<PlaybackTelemetryMonitor>,
}

impl EngineState {
    /// Run one evaluation: at most one single-step transition, with a
    /// monitor reset after any change.
    fn evaluate_at(&self, now: Instant, on_change: &QualityChangeFn) -> Option<QualityLevel> {
        let verdict = self.monitor.lock().analyze_at(now);
        let current = *self.quality.lock();

        if verdict.should_reduce && verdict.should_increase {
            // The thresholds make this impossible; observing it means the
            // telemetry arithmetic is broken. Fail safe by reducing.
            tracing::error!(
                "Telemetry verdict requested reduce and increase simultaneously: {:?}",
                verdict.stats
            );
            debug_assert!(false, "contradictory telemetry verdict");
        }

        let next = if verdict.should_reduce && current != QualityLevel::Low {
            Some((current.step_down(), ChangeReason::Reduced))
        } else if verdict.should_increase
            && !verdict.should_reduce
            && current != QualityLevel::High
        {
            Some((current.step_up(), ChangeReason::Increased))
        } else {
            None
        };

        let (next, reason) = next?;
        self.apply_change(next, reason, now);
        on_change(next);
        Some(next)
    }

    fn apply_change(&self, next: QualityLevel, reason: ChangeReason, now: Instant) {
        *self.quality.lock() = next;
        self.monitor.lock().reset_at(now);
        tracing::info!("Playback quality changed to {} ({:?})", next, reason);
    }
}

/// Client-side controller that picks and adjusts the rendition tier.
///
/// Quality decisions apply to whole-file renditions and take effect on the
/// next playback attempt; there is no mid-stream switching.
pub struct QualityDecisionEngine {
    state: Arc<EngineState>,
    config: PlaybackConfig,
    tick_task: Option<JoinHandle<()>>,
}

impl QualityDecisionEngine {
    /// Create an engine at `initial` quality, typically the network
    /// classifier's recommendation.
    pub fn new(initial: QualityLevel, config: PlaybackConfig) -> Self {
        let state = Arc::new(EngineState {
            quality: Mutex::new(initial),
            monitor: Mutex::new(PlaybackTelemetryMonitor::new(config.clone())),
        });

        Self {
            state,
            config,
            tick_task: None,
        }
    }

    pub fn current_quality(&self) -> QualityLevel {
        *self.state.quality.lock()
    }

    /// Forward one player status tick to the telemetry monitor.
    ///
    /// The monitor lock makes status processing non-reentrant: one update
    /// completes before the next is accepted.
    pub fn on_status(&self, status: PlayerStatus) {
        self.state.monitor.lock().on_status(status);
    }

    /// Reset telemetry for a new playback session
    pub fn begin_session(&self) {
        self.state.monitor.lock().reset();
    }

    /// Current telemetry verdict without applying any transition
    pub fn telemetry(&self) -> TelemetryVerdict {
        self.state.monitor.lock().analyze()
    }

    /// Run one evaluation immediately. Returns the new tier if a
    /// transition happened.
    pub fn evaluate_once(&self, on_change: &QualityChangeFn) -> Option<QualityLevel> {
        self.state.evaluate_at(Instant::now(), on_change)
    }

    /// Begin the periodic evaluation tick.
    ///
    /// A previous monitoring task, if any, is stopped first. `on_change`
    /// fires after every applied transition.
    pub fn start_monitoring(&mut self, on_change: QualityChangeFn) {
        self.stop_monitoring();

        let state = Arc::clone(&self.state);
        let tick_interval = self.config.evaluation_interval;

        self.tick_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);
            // The immediate first tick would evaluate an empty session
            interval.tick().await;

            loop {
                interval.tick().await;
                state.evaluate_at(Instant::now(), &on_change);
            }
        }));
    }

    /// Cancel the periodic tick. Idempotent and safe mid-tick; the engine
    /// keeps its current quality and telemetry.
    pub fn stop_monitoring(&mut self) {
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
    }

    /// Set the tier directly, bypassing telemetry analysis. The monitor is
    /// reset so the next evaluation starts from fresh evidence.
    pub fn manual_override(&self, quality: QualityLevel) {
        self.state
            .apply_change(quality, ChangeReason::ManualOverride, Instant::now());
    }
}

impl Drop for QualityDecisionEngine {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}
