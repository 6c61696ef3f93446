//! Network classification for the initial quality choice
//!
//! Maps a raw connectivity reading into a coarse class and recommends a
//! starting tier. Pure mapping, no retries, no caching; the class feeds the
//! initial rendition choice only and never overrides the hysteresis engine.

use crate::encoding::presets::QualityLevel;

/// Cellular generation reported by the platform, when readable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellularGeneration {
    Cell2g,
    Cell3g,
    Cell4g,
    Cell5g,
}

/// Raw connectivity reading from the playback surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityReading {
    Disconnected,
    Wifi,
    /// Cellular link; generation is `None` when the platform cannot report it
    Cellular(Option<CellularGeneration>),
    /// Connected but the link type cannot be read
    Unreadable,
}

/// Coarse network class used for the initial quality hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkClass {
    Wifi,
    Cell4g,
    Cell3g,
    Cell2g,
    Unknown,
}

impl std::fmt::Display for NetworkClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkClass::Wifi => write!(f, "wifi"),
            NetworkClass::Cell4g => write!(f, "4g"),
            NetworkClass::Cell3g => write!(f, "3g"),
            NetworkClass::Cell2g => write!(f, "2g"),
            NetworkClass::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify a connectivity reading. Disconnected or unreadable links
/// degrade to `Unknown`; this never fails.
pub fn classify(reading: ConnectivityReading) -> NetworkClass {
    match reading {
        ConnectivityReading::Wifi => NetworkClass::Wifi,
        ConnectivityReading::Cellular(Some(generation)) => match generation {
            // 5G links get the same whole-file treatment as 4G
            CellularGeneration::Cell5g | CellularGeneration::Cell4g => NetworkClass::Cell4g,
            CellularGeneration::Cell3g => NetworkClass::Cell3g,
            CellularGeneration::Cell2g => NetworkClass::Cell2g,
        },
        ConnectivityReading::Cellular(None)
        | ConnectivityReading::Disconnected
        | ConnectivityReading::Unreadable => NetworkClass::Unknown,
    }
}

/// Recommended starting tier for a network class.
/// Unknown defaults to `Medium` as the safe middle ground.
pub fn recommended_quality(class: NetworkClass) -> QualityLevel {
    match class {
        NetworkClass::Wifi | NetworkClass::Cell4g => QualityLevel::High,
        NetworkClass::Cell3g => QualityLevel::Medium,
        NetworkClass::Cell2g => QualityLevel::Low,
        NetworkClass::Unknown => QualityLevel::Medium,
    }
}
