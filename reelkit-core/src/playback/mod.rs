//! Client-side adaptive quality controller
//!
//! A network classifier supplies the initial rendition choice, a telemetry
//! monitor observes the playback session, and the decision engine revises the
//! tier for the next playback attempt with hysteresis. Runs on a single
//! cooperative timeline; the evaluation tick is the only suspension point.

pub mod network;
pub mod quality;
pub mod telemetry;

pub use network::{
    CellularGeneration, ConnectivityReading, NetworkClass, classify, recommended_quality,
};
pub use quality::{ChangeReason, QualityChangeFn, QualityDecisionEngine};
pub use telemetry::{PlaybackTelemetryMonitor, PlayerStatus, TelemetryStats, TelemetryVerdict};
