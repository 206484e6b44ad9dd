// Equal-temperament pitch math and standard guitar tuning

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference pitch A4
pub const A4_FREQUENCY_HZ: f64 = 440.0;

/// MIDI number of A4
pub const A4_MIDI: f64 = 69.0;

/// Highest fret on the modelled fretboard
pub const MAX_FRET: u8 = 22;

/// Pitch class names with sharps (tuner display)
pub const SHARP_NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Pitch class names preferring flats where guitar music usually does (Eb, Ab, Bb)
pub const FLAT_NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Convert a frequency to a continuous (unrounded) MIDI value
///
/// `69 + 12 * log2(f / 440)`. Callers must pass a positive frequency.
#[inline]
pub fn frequency_to_midi(frequency_hz: f64) -> f64 {
    A4_MIDI + 12.0 * (frequency_hz / A4_FREQUENCY_HZ).log2()
}

/// Convert a (possibly fractional) MIDI value to a frequency
#[inline]
pub fn midi_to_frequency(midi: f64) -> f64 {
    A4_FREQUENCY_HZ * 2f64.powf((midi - A4_MIDI) / 12.0)
}

/// Name a MIDI note with flat spelling and scientific octave, e.g. 50 -> "D3"
pub fn midi_to_note_name(midi: i32) -> String {
    let pitch_class = midi.rem_euclid(12) as usize;
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", FLAT_NOTE_NAMES[pitch_class], octave)
}

/// One of the six strings of a standard-tuned (EADGBE) guitar
///
/// Numbered the way tablature numbers them: string 1 is the thin high e,
/// string 6 the thick low E.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GuitarString {
    HighE = 1,
    B = 2,
    G = 3,
    D = 4,
    A = 5,
    LowE = 6,
}

impl GuitarString {
    /// All strings, string 1 first. This is the fret-search order.
    pub const ALL: [GuitarString; 6] = [
        GuitarString::HighE,
        GuitarString::B,
        GuitarString::G,
        GuitarString::D,
        GuitarString::A,
        GuitarString::LowE,
    ];

    /// Tablature number (1..=6)
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(GuitarString::HighE),
            2 => Some(GuitarString::B),
            3 => Some(GuitarString::G),
            4 => Some(GuitarString::D),
            5 => Some(GuitarString::A),
            6 => Some(GuitarString::LowE),
            _ => None,
        }
    }

    /// MIDI number of the open string
    pub fn open_midi(self) -> i32 {
        match self {
            GuitarString::HighE => 64,
            GuitarString::B => 59,
            GuitarString::G => 55,
            GuitarString::D => 50,
            GuitarString::A => 45,
            GuitarString::LowE => 40,
        }
    }

    /// Reference frequency of the open string as printed on tuners
    pub fn open_frequency_hz(self) -> f64 {
        match self {
            GuitarString::HighE => 329.63,
            GuitarString::B => 246.94,
            GuitarString::G => 196.0,
            GuitarString::D => 146.83,
            GuitarString::A => 110.0,
            GuitarString::LowE => 82.41,
        }
    }

    /// Lane label (lower-case `e` distinguishes the high string)
    pub fn label(self) -> &'static str {
        match self {
            GuitarString::HighE => "e",
            GuitarString::B => "B",
            GuitarString::G => "G",
            GuitarString::D => "D",
            GuitarString::A => "A",
            GuitarString::LowE => "E",
        }
    }

    /// Open-string note name, e.g. "A2"
    pub fn open_note_name(self) -> String {
        midi_to_note_name(self.open_midi())
    }
}

impl TryFrom<u8> for GuitarString {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        GuitarString::from_number(value)
            .ok_or_else(|| format!("string number must be 1-6 (got {})", value))
    }
}

impl From<GuitarString> for u8 {
    fn from(string: GuitarString) -> Self {
        string.number()
    }
}

impl fmt::Display for GuitarString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// MIDI number sounded by a fretted string
#[inline]
pub fn fretted_midi(string: GuitarString, fret: u8) -> i32 {
    string.open_midi() + i32::from(fret)
}

/// Note name for a string and fret, e.g. (D, 0) -> "D3", (high e, 2) -> "F#4"
pub fn fret_to_note_name(string: GuitarString, fret: u8) -> String {
    midi_to_note_name(fretted_midi(string, fret))
}
