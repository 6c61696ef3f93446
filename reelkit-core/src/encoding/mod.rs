//! Server-side transcoding pipeline
//!
//! Converts one uploaded video into three quality renditions plus an optional
//! thumbnail, and migrates legacy content that predates the rendition ladder.
//! The actual encoding math lives in an external engine invoked as a child
//! process behind the [`Encoder`] trait.

pub mod encoder;
pub mod orchestrator;
pub mod presets;
pub mod store;

pub use encoder::{EncodeError, EncodedRendition, Encoder, FfmpegEncoder, ProgressFn, SimulationEncoder};
pub use orchestrator::{
    CleanupOutcome, JobId, JobProgressFn, MigrationReport, RenditionSet, TranscodeError,
    TranscodeJob, TranscodeOutcome, TranscodingOrchestrator,
};
pub use presets::{QualityLevel, QualityPreset, all_presets, preset_for};
pub use store::{JsonVideoStore, RenditionUrls, StoreError, VideoRecord, VideoStore};
