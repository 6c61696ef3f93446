//! Static quality preset table for the rendition ladder
//!
//! Three tiers (low/medium/high) with fixed dimensions, bitrate caps and CRF
//! values. Pure data shared by the encoder (to build engine arguments) and the
//! playback controller (to validate transition targets).

use serde::{Deserialize, Serialize};

/// Quality tier in the rendition ladder, ordered low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// 480x854 rendition
    Low,
    /// 720x1280 rendition
    Medium,
    /// 1080x1920 rendition
    High,
}

impl QualityLevel {
    /// All levels in encode order (highest first, matching job progression)
    pub const ENCODE_ORDER: [QualityLevel; 3] =
        [QualityLevel::High, QualityLevel::Medium, QualityLevel::Low];

    /// One tier down, clamped at `Low`
    pub fn step_down(self) -> Self {
        match self {
            QualityLevel::High => QualityLevel::Medium,
            QualityLevel::Medium | QualityLevel::Low => QualityLevel::Low,
        }
    }

    /// One tier up, clamped at `High`
    pub fn step_up(self) -> Self {
        match self {
            QualityLevel::Low => QualityLevel::Medium,
            QualityLevel::Medium | QualityLevel::High => QualityLevel::High,
        }
    }

    /// Output filename suffix for this tier (`_low`, `_medium`, `_high`)
    pub fn suffix(self) -> &'static str {
        match self {
            QualityLevel::Low => "_low",
            QualityLevel::Medium => "_medium",
            QualityLevel::High => "_high",
        }
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityLevel::Low => write!(f, "low"),
            QualityLevel::Medium => write!(f, "medium"),
            QualityLevel::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for QualityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(QualityLevel::Low),
            "medium" => Ok(QualityLevel::Medium),
            "high" => Ok(QualityLevel::High),
            _ => Err(format!("Invalid quality level: {s}")),
        }
    }
}

/// Immutable encoding parameters for one quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityPreset {
    pub level: QualityLevel,
    pub width: u32,
    pub height: u32,
    /// Video bitrate ceiling in kbit/s
    pub video_bitrate_kbps: u32,
    /// Audio bitrate ceiling in kbit/s
    pub audio_bitrate_kbps: u32,
    /// Constant rate factor (lower = higher quality)
    pub crf: u8,
}

impl QualityPreset {
    /// Resolution string for the encoder scale filter, e.g. `720x1280`
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

const PRESETS: [QualityPreset; 3] = [
    QualityPreset {
        level: QualityLevel::High,
        width: 1080,
        height: 1920,
        video_bitrate_kbps: 2000,
        audio_bitrate_kbps: 96,
        crf: 23,
    },
    QualityPreset {
        level: QualityLevel::Medium,
        width: 720,
        height: 1280,
        video_bitrate_kbps: 1200,
        audio_bitrate_kbps: 80,
        crf: 24,
    },
    QualityPreset {
        level: QualityLevel::Low,
        width: 480,
        height: 854,
        video_bitrate_kbps: 600,
        audio_bitrate_kbps: 64,
        crf: 26,
    },
];

/// Look up the preset for a quality level
pub fn preset_for(level: QualityLevel) -> &'static QualityPreset {
    match level {
        QualityLevel::High => &PRESETS[0],
        QualityLevel::Medium => &PRESETS[1],
        QualityLevel::Low => &PRESETS[2],
    }
}

/// All presets in encode order (high, medium, low)
pub fn all_presets() -> &'static [QualityPreset; 3] {
    &PRESETS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_three_tiers_strictly_ordered() {
        let presets = all_presets();
        assert_eq!(presets.len(), 3);

        // Bitrate descends high -> low, CRF ascends high -> low
        assert!(presets[0].video_bitrate_kbps > presets[1].video_bitrate_kbps);
        assert!(presets[1].video_bitrate_kbps > presets[2].video_bitrate_kbps);
        assert!(presets[0].audio_bitrate_kbps > presets[1].audio_bitrate_kbps);
        assert!(presets[1].audio_bitrate_kbps > presets[2].audio_bitrate_kbps);
        assert!(presets[0].crf < presets[1].crf);
        assert!(presets[1].crf < presets[2].crf);
    }

    #[test]
    fn test_preset_lookup_matches_level() {
        assert_eq!(preset_for(QualityLevel::High).resolution(), "1080x1920");
        assert_eq!(preset_for(QualityLevel::Medium).resolution(), "720x1280");
        assert_eq!(preset_for(QualityLevel::Low).resolution(), "480x854");

        for level in QualityLevel::ENCODE_ORDER {
            assert_eq!(preset_for(level).level, level);
        }
    }

    #[test]
    fn test_step_transitions_clamp_at_edges() {
        assert_eq!(QualityLevel::High.step_down(), QualityLevel::Medium);
        assert_eq!(QualityLevel::Medium.step_down(), QualityLevel::Low);
        assert_eq!(QualityLevel::Low.step_down(), QualityLevel::Low);

        assert_eq!(QualityLevel::Low.step_up(), QualityLevel::Medium);
        assert_eq!(QualityLevel::Medium.step_up(), QualityLevel::High);
        assert_eq!(QualityLevel::High.step_up(), QualityLevel::High);
    }

    #[test]
    fn test_level_roundtrip_parse() {
        for level in QualityLevel::ENCODE_ORDER {
            let parsed: QualityLevel = level.to_string().parse().unwrap();
            assert_eq!(parsed, level);
        }
        assert!("ultra".parse::<QualityLevel>().is_err());
    }

    #[test]
    fn test_filename_suffixes() {
        assert_eq!(QualityLevel::High.suffix(), "_high");
        assert_eq!(QualityLevel::Medium.suffix(), "_medium");
        assert_eq!(QualityLevel::Low.suffix(), "_low");
    }
}
