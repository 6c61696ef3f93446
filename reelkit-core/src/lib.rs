//! Reelkit Core - Adaptive video delivery
//!
//! This crate provides the adaptive video delivery subsystem: a server-side
//! transcoding pipeline that turns one upload into a rendition ladder, and a
//! client-side controller that picks and adjusts which rendition to play from
//! observed playback health and network class.

pub mod config;
pub mod encoding;
pub mod playback;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::ReelkitConfig;
pub use encoding::{Encoder, QualityLevel, TranscodeError, TranscodingOrchestrator};
pub use playback::QualityDecisionEngine;

/// Core errors that can bubble up from any Reelkit subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ReelkitError {
    #[error("Encode error: {0}")]
    Encode(#[from] encoding::EncodeError),

    #[error("Transcode error: {0}")]
    Transcode(#[from] encoding::TranscodeError),

    #[error("Store error: {0}")]
    Store(#[from] encoding::StoreError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReelkitError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            ReelkitError::Encode(e) => match e {
                encoding::EncodeError::SpawnFailed { .. } => {
                    "Encoding engine could not be started".to_string()
                }
                encoding::EncodeError::Timeout { seconds } => {
                    format!("Encoding timed out after {seconds} seconds")
                }
                _ => "Encoding error occurred".to_string(),
            },
            ReelkitError::Transcode(e) => match e {
                encoding::TranscodeError::SourceMissing { path } => {
                    format!("Source video not found: {}", path.display())
                }
                encoding::TranscodeError::PresetFailed { level, .. } => {
                    format!("Encoding the {level} rendition failed")
                }
                _ => "Transcoding error occurred".to_string(),
            },
            ReelkitError::Store(_) => "Video metadata store error occurred".to_string(),
            ReelkitError::Configuration { reason } => format!("Configuration error: {reason}"),
            ReelkitError::Io(_) => "File system error occurred".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReelkitError>;
