//! Heart-rate zones and transition detection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ControlError;

/// Lowest BPM of the medium zone.
pub const MEDIUM_MIN_BPM: u32 = 100;
/// Lowest BPM of the fast zone.
pub const FAST_MIN_BPM: u32 = 120;

/// Tempo zone a heart-rate reading falls into.
///
/// The absence of a reading is modeled as `Option::<Zone>::None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Slow,
    Medium,
    Fast,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Slow, Zone::Medium, Zone::Fast];

    /// Key used for this zone in the `playlists` configuration section.
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Slow => "slow",
            Zone::Medium => "medium",
            Zone::Fast => "fast",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(Zone::Slow),
            "medium" => Ok(Zone::Medium),
            "fast" => Ok(Zone::Fast),
            other => Err(ControlError::UnknownZone(other.to_string())),
        }
    }
}

/// Maps a reading to its zone: `[0,100)` slow, `[100,120)` medium, `[120,∞)` fast.
pub fn classify(bpm: Option<u32>) -> Option<Zone> {
    let bpm = bpm?;
    Some(if bpm >= FAST_MIN_BPM {
        Zone::Fast
    } else if bpm >= MEDIUM_MIN_BPM {
        Zone::Medium
    } else {
        Zone::Slow
    })
}

/// A change of zone between two consecutive readings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneTransition {
    pub from: Option<Zone>,
    pub to: Option<Zone>,
}

/// Remembers the last zone and reports transitions.
///
/// Readings that stay in the same zone produce nothing, whatever the BPM
/// distance between them.
#[derive(Clone, Debug, Default)]
pub struct ZoneTracker {
    last: Option<Zone>,
}

impl ZoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_zone(&self) -> Option<Zone> {
        self.last
    }

    pub fn observe(&mut self, bpm: Option<u32>) -> Option<ZoneTransition> {
        let zone = classify(bpm);
        if zone == self.last {
            return None;
        }
        let transition = ZoneTransition {
            from: self.last,
            to: zone,
        };
        self.last = zone;
        Some(transition)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ranges() {
        for bpm in 0..100 {
            assert_eq!(classify(Some(bpm)), Some(Zone::Slow), "bpm {bpm}");
        }
        for bpm in 100..120 {
            assert_eq!(classify(Some(bpm)), Some(Zone::Medium), "bpm {bpm}");
        }
        for bpm in [120, 121, 150, 220, u32::MAX] {
            assert_eq!(classify(Some(bpm)), Some(Zone::Fast), "bpm {bpm}");
        }
        assert_eq!(classify(None), None);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(classify(Some(99)), Some(Zone::Slow));
        assert_eq!(classify(Some(100)), Some(Zone::Medium));
        assert_eq!(classify(Some(119)), Some(Zone::Medium));
        assert_eq!(classify(Some(120)), Some(Zone::Fast));
    }

    #[test]
    fn test_repeated_zone_fires_once() {
        let mut tracker = ZoneTracker::new();
        let fired: Vec<_> = [60, 72, 85, 99]
            .into_iter()
            .filter_map(|bpm| tracker.observe(Some(bpm)))
            .collect();

        assert_eq!(
            fired,
            vec![ZoneTransition {
                from: None,
                to: Some(Zone::Slow)
            }]
        );
    }

    #[test]
    fn test_transition_to_none() {
        let mut tracker = ZoneTracker::new();
        tracker.observe(Some(130));
        let transition = tracker.observe(None).unwrap();
        assert_eq!(transition.from, Some(Zone::Fast));
        assert_eq!(transition.to, None);
        assert!(tracker.observe(None).is_none());
    }

    #[test]
    fn test_zone_from_str() {
        assert_eq!("FAST".parse::<Zone>().unwrap(), Zone::Fast);
        assert!("warp".parse::<Zone>().is_err());
    }
}
