// Note resolver - frequency -> MIDI -> (string, fret)
//
// Acceptance order for each pitch frame:
// 1. Silence gate: RMS below threshold clears everything, including the hold
// 2. Clarity and frequency-range checks
// 3. Fret search across the six strings within a semitone tolerance
// Frames failing 2 or 3 re-emit the last valid match if it is younger than
// the hold window; otherwise they report nothing.

use super::features::PitchFrame;
use super::NoteMatch;
use crate::config::NoteDetectionConfig;
use crate::theory::{frequency_to_midi, GuitarString};

/// Closest playable position for a continuous MIDI value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FretPosition {
    pub string: GuitarString,
    pub fret: u8,
    /// Distance in semitones between the observed pitch and the fret
    pub error: f64,
}

/// Search all strings (string 1 first) for the fret nearest to `midi_raw`
///
/// The first string reaching the smallest error wins ties. Positions whose
/// rounded fret lies outside `0..=max_fret` are skipped, and the best match
/// is rejected when its error exceeds `tolerance`.
pub fn resolve_fret(midi_raw: f64, max_fret: u8, tolerance: f64) -> Option<FretPosition> {
    let mut best: Option<FretPosition> = None;

    for string in GuitarString::ALL {
        let fret_raw = midi_raw - f64::from(string.open_midi());
        let fret = fret_raw.round();
        if fret < 0.0 || fret > f64::from(max_fret) {
            continue;
        }
        let error = (fret_raw - fret).abs();
        if best.map_or(true, |b| error < b.error) {
            best = Some(FretPosition {
                string,
                fret: fret as u8,
                error,
            });
        }
    }

    best.filter(|b| b.error <= tolerance)
}

/// Stateful resolver with dropout hold
#[derive(Debug, Clone)]
pub struct NoteResolver {
    config: NoteDetectionConfig,
    last_valid: Option<(NoteMatch, f64)>,
}

impl NoteResolver {
    pub fn new(config: NoteDetectionConfig) -> Self {
        Self {
            config,
            last_valid: None,
        }
    }

    pub fn config(&self) -> &NoteDetectionConfig {
        &self.config
    }

    /// Resolve one pitch frame observed at `now_ms`
    ///
    /// # Returns
    /// The confident match for this frame, a held match during a short
    /// dropout, or `None`. Rejected-by-tolerance and not-detected are not
    /// distinguished.
    pub fn resolve(&mut self, frame: &PitchFrame, now_ms: f64) -> Option<NoteMatch> {
        if frame.rms < self.config.rms_threshold {
            self.last_valid = None;
            return None;
        }

        if let Some(note) = self.accept(frame) {
            self.last_valid = Some((note.clone(), now_ms));
            return Some(note);
        }

        match &self.last_valid {
            Some((held, at)) if now_ms - at < self.config.hold_ms => Some(held.clone()),
            _ => {
                self.last_valid = None;
                None
            }
        }
    }

    /// Forget any held match (stream stopped)
    pub fn reset(&mut self) {
        self.last_valid = None;
    }

    fn accept(&self, frame: &PitchFrame) -> Option<NoteMatch> {
        let in_range = frame.frequency_hz > self.config.min_frequency_hz
            && frame.frequency_hz < self.config.max_frequency_hz;
        if frame.clarity < self.config.clarity_threshold || !in_range {
            return None;
        }

        let midi_raw = frequency_to_midi(f64::from(frame.frequency_hz));
        let position = resolve_fret(
            midi_raw,
            self.config.max_fret,
            self.config.fret_tolerance_semitones,
        )?;

        Some(NoteMatch {
            midi: midi_raw.round() as i32,
            string: position.string,
            fret: position.fret,
            frequency_hz: frame.frequency_hz,
            clarity: frame.clarity,
        })
    }
}
