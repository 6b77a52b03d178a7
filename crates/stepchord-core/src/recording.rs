//! Live recording: key presses to quantized steps

use std::time::{Duration, Instant};

use tracing::debug;

use crate::pitch::Pitch;
use crate::transport::step_duration_ms;

/// A captured key press, not yet written to a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedNote {
    pub pitch: Pitch,
    pub step: usize,
    pub velocity: u8,
}

/// Quantize time since the take started onto the step grid.
///
/// Rounds to the nearest step so near-simultaneous presses land together,
/// and wraps past the pattern end so long takes keep writing into the loop.
pub fn quantize_elapsed(elapsed: Duration, bpm: f64, total_steps: usize) -> usize {
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    let raw_step = elapsed_ms / step_duration_ms(bpm);
    (raw_step.round() as usize) % total_steps.max(1)
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    started_at: Option<Instant>,
    buffer: Vec<RecordedNote>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a take, clearing anything captured before
    pub fn begin(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.buffer.clear();
    }

    pub fn is_recording(&self) -> bool {
        self.started_at.is_some()
    }

    /// Buffer a key press; returns its step, or `None` outside a take
    pub fn capture(&mut self, now: Instant, pitch: Pitch, velocity: u8, bpm: f64, total_steps: usize) -> Option<usize> {
        let started_at = self.started_at?;
        let step = quantize_elapsed(now.saturating_duration_since(started_at), bpm, total_steps);
        debug!("Captured {} at step {}", pitch, step);
        self.buffer.push(RecordedNote { pitch, step, velocity });
        Some(step)
    }

    pub fn captured(&self) -> &[RecordedNote] {
        &self.buffer
    }

    /// End the take and hand over the buffer
    pub fn finish(&mut self) -> Vec<RecordedNote> {
        self.started_at = None;
        std::mem::take(&mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::PitchClass;

    #[test]
    fn test_presses_10ms_apart_share_a_step() {
        let a = quantize_elapsed(Duration::from_millis(500), 120.0, 64);
        let b = quantize_elapsed(Duration::from_millis(510), 120.0, 64);
        assert_eq!(a, 4);
        assert_eq!(a, b);

        // Straddling a half-step boundary still rounds both to the nearer step
        assert_eq!(quantize_elapsed(Duration::from_millis(120), 120.0, 64), 1);
        assert_eq!(quantize_elapsed(Duration::from_millis(130), 120.0, 64), 1);
    }

    #[test]
    fn test_rounds_rather_than_floors() {
        assert_eq!(quantize_elapsed(Duration::from_millis(100), 120.0, 64), 1);
        assert_eq!(quantize_elapsed(Duration::from_millis(60), 120.0, 64), 0);
    }

    #[test]
    fn test_wraps_past_pattern_end() {
        // 16 steps at 125ms = 2s per loop
        assert_eq!(quantize_elapsed(Duration::from_millis(2250), 120.0, 16), 2);
    }

    #[test]
    fn test_capture_only_during_take() {
        let start = Instant::now();
        let mut recorder = Recorder::new();
        let c4 = Pitch::new(PitchClass::C, 4);
        assert_eq!(recorder.capture(start, c4, 100, 120.0, 16), None);

        recorder.begin(start);
        assert_eq!(recorder.capture(start + Duration::from_millis(250), c4, 100, 120.0, 16), Some(2));
        assert_eq!(recorder.captured().len(), 1);

        let take = recorder.finish();
        assert_eq!(take.len(), 1);
        assert!(!recorder.is_recording());
        assert!(recorder.captured().is_empty());
    }
}
