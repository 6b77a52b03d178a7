//! Transport state machine and step scheduler
//!
//! The scheduler does not own a timer. A clock (see stepchord-services)
//! asks for [`Scheduler::step_duration`] before every wait, so tempo changes
//! apply from the next tick, and hands back the [`TickToken`] it was started
//! with; a token from an earlier play/record run is stale and its tick is a
//! no-op.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::document::Document;
use crate::note::Note;
use crate::playback::NoteTrigger;
use crate::track::Track;

pub const DEFAULT_BPM: f64 = 120.0;
pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 300.0;
pub const DEFAULT_TOTAL_STEPS: usize = 64;
pub const MAX_TOTAL_STEPS: usize = 256;

/// Transport playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Recording,
}

/// Identifies one play/record run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

/// Milliseconds per step (one 16th note) at a tempo
pub fn step_duration_ms(bpm: f64) -> f64 {
    (60_000.0 / bpm) / 4.0
}

/// Trigger data for one note on a track at a tempo
pub fn trigger_for(track: &Track, note: &Note, step_ms: f64) -> NoteTrigger {
    NoteTrigger {
        pitch_class: note.pitch_class,
        octave: note.octave,
        duration_secs: note.length * step_ms / 1000.0,
        instrument_id: track.instrument_id.clone(),
        velocity: (note.velocity as f32 / 127.0) * (track.volume / 100.0),
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    state: TransportState,
    bpm: f64,
    total_steps: usize,
    current_step: usize,
    /// False until the first tick of a run has sounded step 0
    started: bool,
    epoch: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BPM, DEFAULT_TOTAL_STEPS)
    }
}

impl Scheduler {
    pub fn new(bpm: f64, total_steps: usize) -> Self {
        let mut scheduler = Self {
            state: TransportState::Stopped,
            bpm: DEFAULT_BPM,
            total_steps: DEFAULT_TOTAL_STEPS,
            current_step: 0,
            started: false,
            epoch: 0,
        };
        scheduler.set_bpm(bpm);
        scheduler.set_total_steps(total_steps);
        scheduler
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state != TransportState::Stopped
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Clamp to the supported range; returns the tempo actually applied
    pub fn set_bpm(&mut self, bpm: f64) -> f64 {
        self.bpm = if bpm.is_finite() { bpm.clamp(MIN_BPM, MAX_BPM) } else { DEFAULT_BPM };
        debug!("Tempo set to {} BPM", self.bpm);
        self.bpm
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn set_total_steps(&mut self, total_steps: usize) {
        self.total_steps = total_steps.clamp(1, MAX_TOTAL_STEPS);
        self.current_step %= self.total_steps;
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step_duration_ms(&self) -> f64 {
        step_duration_ms(self.bpm)
    }

    /// Interval before the next tick, read from the live tempo
    pub fn step_duration(&self) -> Duration {
        Duration::from_secs_f64(self.step_duration_ms() / 1000.0)
    }

    fn begin(&mut self, state: TransportState) -> TickToken {
        self.state = state;
        self.current_step = 0;
        self.started = false;
        self.epoch += 1;
        info!("Transport {:?} at {} BPM", state, self.bpm);
        TickToken(self.epoch)
    }

    /// Stopped -> Playing. Playing again toggles back to Stopped (`None`);
    /// ignored while recording.
    pub fn play(&mut self) -> Option<TickToken> {
        match self.state {
            TransportState::Stopped => Some(self.begin(TransportState::Playing)),
            TransportState::Playing => {
                self.stop();
                None
            }
            TransportState::Recording => None,
        }
    }

    /// Enter Recording; a running playback is stopped first
    pub fn record(&mut self) -> Option<TickToken> {
        match self.state {
            TransportState::Recording => None,
            TransportState::Playing => {
                self.stop();
                Some(self.begin(TransportState::Recording))
            }
            TransportState::Stopped => Some(self.begin(TransportState::Recording)),
        }
    }

    /// Back to Stopped at step 0. Invalidates every outstanding token.
    /// Returns whether the state changed.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = TransportState::Stopped;
        self.current_step = 0;
        self.started = false;
        self.epoch += 1;
        if was_running {
            info!("Transport stopped");
        }
        was_running
    }

    pub fn is_current(&self, token: TickToken) -> bool {
        self.is_running() && token.0 == self.epoch
    }

    /// Advance one step and collect due notes. The first tick of a run
    /// sounds step 0 without advancing. Stale tokens yield `None`.
    pub fn tick(&mut self, token: TickToken, doc: &Document) -> Option<Vec<NoteTrigger>> {
        if !self.is_current(token) {
            return None;
        }
        if self.started {
            self.current_step = (self.current_step + 1) % self.total_steps;
        } else {
            self.started = true;
        }
        Some(self.triggers_at(self.current_step, doc))
    }

    /// Triggers for every audible track at a step, in track order then note order
    pub fn triggers_at(&self, step: usize, doc: &Document) -> Vec<NoteTrigger> {
        let step_ms = self.step_duration_ms();
        doc.audible_tracks()
            .flat_map(|track| {
                track
                    .notes_at_step(step)
                    .into_iter()
                    .map(move |note| trigger_for(track, note, step_ms))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{Pitch, PitchClass};

    fn doc_with_notes(steps: &[f64]) -> Document {
        let mut doc = Document::new();
        let t = doc.add_track("Piano", "piano");
        doc.track_mut(t).unwrap().set_volume(100.0);
        for &step in steps {
            doc.add_note(t, Pitch::new(PitchClass::C, 4), step, 127, 1.0).unwrap();
        }
        doc
    }

    #[test]
    fn test_step_duration_at_120_bpm() {
        let scheduler = Scheduler::new(120.0, 16);
        assert_eq!(scheduler.step_duration_ms(), 125.0);
        assert_eq!(scheduler.step_duration(), Duration::from_millis(125));
    }

    #[test]
    fn test_bpm_change_applies_to_next_interval() {
        let mut scheduler = Scheduler::new(120.0, 16);
        let doc = doc_with_notes(&[]);
        let token = scheduler.play().unwrap();
        scheduler.tick(token, &doc).unwrap();

        scheduler.set_bpm(60.0);
        assert!(scheduler.is_current(token));
        assert_eq!(scheduler.step_duration(), Duration::from_millis(250));
    }

    #[test]
    fn test_bpm_is_clamped() {
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.set_bpm(1000.0), MAX_BPM);
        assert_eq!(scheduler.set_bpm(0.0), MIN_BPM);
        assert_eq!(scheduler.set_bpm(f64::NAN), DEFAULT_BPM);
    }

    #[test]
    fn test_state_transitions() {
        let mut scheduler = Scheduler::default();
        assert!(scheduler.play().is_some());
        assert_eq!(scheduler.state(), TransportState::Playing);
        assert!(scheduler.play().is_none());
        assert_eq!(scheduler.state(), TransportState::Stopped);

        assert!(scheduler.record().is_some());
        assert!(scheduler.play().is_none());
        assert_eq!(scheduler.state(), TransportState::Recording);
        assert!(scheduler.stop());
        assert!(!scheduler.stop());
    }

    #[test]
    fn test_ticks_wrap_and_stop_resets() {
        let mut scheduler = Scheduler::new(120.0, 4);
        let doc = doc_with_notes(&[0.0, 2.0]);
        let token = scheduler.play().unwrap();

        let counts: Vec<usize> = (0..6).map(|_| scheduler.tick(token, &doc).unwrap().len()).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 1, 0]);
        assert_eq!(scheduler.current_step(), 1);

        scheduler.stop();
        assert_eq!(scheduler.current_step(), 0);
    }

    #[test]
    fn test_stale_tick_is_noop() {
        let mut scheduler = Scheduler::new(120.0, 4);
        let doc = doc_with_notes(&[0.0]);
        let old = scheduler.play().unwrap();
        scheduler.stop();
        assert!(scheduler.tick(old, &doc).is_none());

        let new = scheduler.play().unwrap();
        assert!(scheduler.tick(old, &doc).is_none());
        assert!(scheduler.tick(new, &doc).is_some());
    }

    #[test]
    fn test_trigger_values() {
        let mut scheduler = Scheduler::new(120.0, 16);
        let mut doc = doc_with_notes(&[0.0]);
        let track = doc.tracks[0].id;
        doc.track_mut(track).unwrap().set_volume(50.0);
        doc.track_mut(track).unwrap().notes[0].length = 2.0;

        let token = scheduler.play().unwrap();
        let triggers = scheduler.tick(token, &doc).unwrap();
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].duration_secs, 0.25);
        assert_eq!(triggers[0].velocity, 0.5);
        assert_eq!(triggers[0].instrument_id, "piano");
    }

    #[test]
    fn test_fractional_steps_sound_on_host_step() {
        let mut scheduler = Scheduler::new(120.0, 8);
        let doc = doc_with_notes(&[1.25]);
        let token = scheduler.play().unwrap();
        assert!(scheduler.tick(token, &doc).unwrap().is_empty());
        assert_eq!(scheduler.tick(token, &doc).unwrap().len(), 1);
    }

    #[test]
    fn test_mute_and_solo_policy() {
        let mut scheduler = Scheduler::new(120.0, 16);
        let mut doc = Document::new();
        let a = doc.add_track("A", "piano");
        let b = doc.add_track("B", "bass");
        for t in [a, b] {
            doc.add_note(t, Pitch::new(PitchClass::C, 3), 0.0, 100, 1.0).unwrap();
        }

        doc.track_mut(a).unwrap().muted = true;
        let instruments: Vec<String> = scheduler.triggers_at(0, &doc).into_iter().map(|t| t.instrument_id).collect();
        assert_eq!(instruments, vec!["bass"]);

        // A soloed track plays even when muted; everything else is silenced
        doc.track_mut(a).unwrap().solo = true;
        let instruments: Vec<String> = scheduler.triggers_at(0, &doc).into_iter().map(|t| t.instrument_id).collect();
        assert_eq!(instruments, vec!["piano"]);

        let token = scheduler.play().unwrap();
        assert_eq!(scheduler.tick(token, &doc).unwrap().len(), 1);
    }
}
