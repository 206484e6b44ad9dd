//! Music theory data: pitch math, guitar tuning, chord dictionary and the
//! song/pattern catalog.
//!
//! Everything here is immutable lookup data built once at startup.

pub mod chords;
pub mod pitch;
pub mod songs;

pub use chords::{chord, curriculum, next_chord, Barre, ChordTemplate, FingerPosition, StringState};
pub use pitch::{
    fret_to_note_name, fretted_midi, frequency_to_midi, midi_to_frequency, midi_to_note_name,
    GuitarString, FLAT_NOTE_NAMES, MAX_FRET, SHARP_NOTE_NAMES,
};
pub use songs::{
    builtin_catalog, Catalog, CatalogEntry, Difficulty, FingerpickPattern, NoteEvent, PickStep,
    Song,
};
