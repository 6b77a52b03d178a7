//! Session configuration

use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::note::DEFAULT_VELOCITY;
use crate::transform::SnapUnit;
use crate::transport::{DEFAULT_BPM, DEFAULT_TOTAL_STEPS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub bpm: f64,
    /// Steps in the looping pattern
    pub total_steps: usize,
    pub snap: SnapUnit,
    pub snap_enabled: bool,
    /// Undo entries kept per track
    pub history_capacity: usize,
    pub default_velocity: u8,
    pub default_octave: i8,
    /// Tonic of the starting key
    pub key: String,
    /// Offset between chord tones when inserting chords, in steps
    pub chord_strum: f64,
    /// Seed for humanize and random arpeggios; random when unset
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            total_steps: DEFAULT_TOTAL_STEPS,
            snap: SnapUnit::default(),
            snap_enabled: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_velocity: DEFAULT_VELOCITY,
            default_octave: 4,
            key: "C".to_string(),
            chord_strum: 0.0,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{ "bpm": 90.0, "snap": 0.5 }"#).unwrap();
        assert_eq!(config.bpm, 90.0);
        assert_eq!(config.snap, SnapUnit::HALF_STEP);
        assert_eq!(config.total_steps, DEFAULT_TOTAL_STEPS);
        assert_eq!(config.key, "C");
        assert!(config.seed.is_none());
    }
}
