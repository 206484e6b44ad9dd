// Analysis module - audio-to-symbol recognition
//
// Two recognition paths share the feature backend:
// - chord mode: ChromaExtractor -> NoiseFloorCalibrator -> ChromagramSmoother -> ChordMatcher
// - note mode:  McLeod pitch + RMS -> NoteResolver (with dropout hold)
//
// Every recogniser reports "nothing confident" as `None`; no recognition
// path returns an error. The tuner and flashcard judge are thin consumers
// of the same frames.

pub mod chord_matcher;
pub mod features;
pub mod flashcard;
pub mod note_resolver;
pub mod pipeline;
pub mod smoother;
pub mod tuner;

use serde::{Deserialize, Serialize};

use crate::theory::GuitarString;

pub use chord_matcher::{cosine_similarity, match_chord, normalize_by_max, ChordMatcher};
pub use flashcard::{FlashcardJudge, FlashcardProgress, FlashcardStatus};
pub use note_resolver::{resolve_fret, FretPosition, NoteResolver};
pub use pipeline::{ChordFrame, ChordFrameOutcome, ChordPipeline, NoteFrame, NotePipeline};
pub use smoother::ChromagramSmoother;
pub use tuner::{Tuner, TunerReading, TuningStatus};

/// Number of chromatic pitch classes (C..B)
pub const PITCH_CLASSES: usize = 12;

/// Energy per pitch class, index 0 = C
pub type ChromaVector = [f32; PITCH_CLASSES];

/// Most recent chord recognition result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordMatch {
    /// Dictionary name, e.g. "Em"
    pub chord: String,
    /// Cosine similarity in [0, 1]
    pub confidence: f32,
}

/// Most recent note recognition result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMatch {
    /// Rounded MIDI number of the observed pitch
    pub midi: i32,
    /// Best-guess string; the lowest-numbered string wins ambiguous pitches
    pub string: GuitarString,
    pub fret: u8,
    pub frequency_hz: f32,
    pub clarity: f32,
}
