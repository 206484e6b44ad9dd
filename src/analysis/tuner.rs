// Tuner - frequency -> nearest equal-tempered note, cent offset and string

use serde::{Deserialize, Serialize};

use crate::config::TunerConfig;
use crate::theory::{GuitarString, SHARP_NOTE_NAMES};

/// How far a reading is from the nearest note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningStatus {
    InTune,
    Close,
    Off,
}

/// Nearest note to a frequency, relative to A4 = 440 Hz
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteReading {
    /// Sharp-spelled pitch class, e.g. "F#"
    pub note: &'static str,
    pub octave: i32,
    /// Offset from the nearest note in cents, in [-50, 50]
    pub cents: f64,
}

/// One accepted tuner frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TunerReading {
    pub note: &'static str,
    pub octave: i32,
    pub cents: f64,
    pub frequency_hz: f32,
    pub nearest_string: GuitarString,
    pub status: TuningStatus,
}

/// Nearest note name, octave and cents offset for a positive frequency
pub fn frequency_to_note(frequency_hz: f64) -> NoteReading {
    let semitones = 12.0 * (frequency_hz / 440.0).log2();
    let rounded = semitones.round();
    let cents = (semitones - rounded) * 100.0;

    // Semitone 0 is A4; shift so index 0 is C
    let rounded = rounded as i32;
    let note_index = (rounded.rem_euclid(12) + 9) % 12;
    let octave = (rounded + 57).div_euclid(12);

    NoteReading {
        note: SHARP_NOTE_NAMES[note_index as usize],
        octave,
        cents,
    }
}

/// Open string whose reference frequency is closest in Hz (low E checked first)
pub fn nearest_string(frequency_hz: f64) -> GuitarString {
    let mut best = GuitarString::LowE;
    let mut best_distance = f64::INFINITY;
    for string in GuitarString::ALL.iter().rev() {
        let distance = (frequency_hz - string.open_frequency_hz()).abs();
        if distance < best_distance {
            best_distance = distance;
            best = *string;
        }
    }
    best
}

/// Stateless tuner over the configured acceptance gates
#[derive(Debug, Clone, Default)]
pub struct Tuner {
    config: TunerConfig,
}

impl Tuner {
    pub fn new(config: TunerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// Read one pitch estimate
    ///
    /// Only very clear estimates (clarity strictly above the threshold)
    /// inside the open-string range produce a reading.
    pub fn read(&self, frequency_hz: f32, clarity: f32) -> Option<TunerReading> {
        if clarity <= self.config.clarity_threshold
            || frequency_hz <= self.config.min_frequency_hz
            || frequency_hz >= self.config.max_frequency_hz
        {
            return None;
        }

        let frequency = f64::from(frequency_hz);
        let note = frequency_to_note(frequency);
        let status = self.status(note.cents);

        Some(TunerReading {
            note: note.note,
            octave: note.octave,
            cents: note.cents,
            frequency_hz,
            nearest_string: nearest_string(frequency),
            status,
        })
    }

    fn status(&self, cents: f64) -> TuningStatus {
        let off_by = cents.abs();
        if off_by < self.config.in_tune_cents {
            TuningStatus::InTune
        } else if off_by < self.config.close_cents {
            TuningStatus::Close
        } else {
            TuningStatus::Off
        }
    }
}
