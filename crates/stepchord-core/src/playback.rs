//! Playback collaborator contract and trigger dispatch

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::pitch::PitchClass;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),
    #[error("Playback unavailable: {0}")]
    Unavailable(String),
}

/// One `play_note` call worth of data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteTrigger {
    pub pitch_class: PitchClass,
    pub octave: i8,
    pub duration_secs: f64,
    pub instrument_id: String,
    /// 0.0 to 1.0
    pub velocity: f32,
}

/// Sound output. Calls are fire-and-forget and must not block.
pub trait Player: Send + Sync {
    fn play_note(
        &self,
        pitch_class: PitchClass,
        octave: i8,
        duration_secs: f64,
        instrument_id: &str,
        velocity: f32,
    ) -> Result<(), PlaybackError>;

    fn stop_all_notes(&self);
}

/// Send triggers to the player; a failing note is logged and skipped.
/// Returns how many notes were accepted.
pub fn dispatch(player: &dyn Player, triggers: &[NoteTrigger]) -> usize {
    let mut sent = 0;
    for t in triggers {
        match player.play_note(t.pitch_class, t.octave, t.duration_secs, &t.instrument_id, t.velocity) {
            Ok(()) => sent += 1,
            Err(e) => warn!("Skipped {}{} on {}: {}", t.pitch_class, t.octave, t.instrument_id, e),
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Rejects one instrument, records the rest
    #[derive(Default)]
    struct PickyPlayer {
        played: Mutex<Vec<String>>,
    }

    impl Player for PickyPlayer {
        fn play_note(&self, pc: PitchClass, octave: i8, _: f64, instrument: &str, _: f32) -> Result<(), PlaybackError> {
            if instrument == "broken" {
                return Err(PlaybackError::UnknownInstrument(instrument.to_string()));
            }
            self.played.lock().unwrap().push(format!("{pc}{octave}"));
            Ok(())
        }

        fn stop_all_notes(&self) {}
    }

    fn trigger(pc: PitchClass, instrument: &str) -> NoteTrigger {
        NoteTrigger {
            pitch_class: pc,
            octave: 4,
            duration_secs: 0.125,
            instrument_id: instrument.to_string(),
            velocity: 0.5,
        }
    }

    #[test]
    fn test_dispatch_skips_failing_note_only() {
        let player = PickyPlayer::default();
        let triggers = [
            trigger(PitchClass::C, "piano"),
            trigger(PitchClass::E, "broken"),
            trigger(PitchClass::G, "piano"),
        ];
        assert_eq!(dispatch(&player, &triggers), 2);
        assert_eq!(*player.played.lock().unwrap(), vec!["C4", "G4"]);
    }
}
