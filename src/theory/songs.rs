// Song and fingerpick-pattern catalog
//
// Melodies are sequences of note/rest events with durations in beats.
// Patterns are string-only picking sequences played over a held chord.
// The built-in catalog is constructed once; externally generated material
// uses the same serde shapes and can be loaded from JSON.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::pitch::GuitarString;

/// Rough skill level of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// One event of a melody
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NoteEvent {
    Note {
        string: GuitarString,
        fret: u8,
        beats: f64,
    },
    Rest {
        beats: f64,
    },
}

impl NoteEvent {
    pub fn beats(&self) -> f64 {
        match self {
            NoteEvent::Note { beats, .. } | NoteEvent::Rest { beats } => *beats,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, NoteEvent::Rest { .. })
    }
}

/// A single-note melody
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    pub difficulty: Difficulty,
    pub bpm: f64,
    #[serde(default)]
    pub description: String,
    pub notes: Vec<NoteEvent>,
}

impl Song {
    /// Number of sounding notes (rests excluded)
    pub fn note_count(&self) -> usize {
        self.notes.iter().filter(|n| !n.is_rest()).count()
    }

    /// Length of one pass in beats, rests included
    pub fn total_beats(&self) -> f64 {
        self.notes.iter().map(NoteEvent::beats).sum()
    }
}

/// One step of a picking pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickStep {
    pub string: GuitarString,
    pub beats: f64,
}

/// A fingerpicking exercise over one chord shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerpickPattern {
    pub id: String,
    pub title: String,
    pub chord_name: String,
    pub difficulty: Difficulty,
    pub bpm: f64,
    #[serde(default = "default_pattern_loops")]
    pub loops: u32,
    #[serde(default)]
    pub description: String,
    pub sequence: Vec<PickStep>,
}

fn default_pattern_loops() -> u32 {
    4
}

/// Either kind of catalog entry
#[derive(Debug, Clone, Copy)]
pub enum CatalogEntry<'a> {
    Melody(&'a Song),
    Pattern(&'a FingerpickPattern),
}

/// Songs and patterns available for practice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub songs: Vec<Song>,
    #[serde(default)]
    pub patterns: Vec<FingerpickPattern>,
}

impl Catalog {
    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn song(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    pub fn pattern(&self, id: &str) -> Option<&FingerpickPattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    /// Songs are searched before patterns
    pub fn entry(&self, id: &str) -> Option<CatalogEntry<'_>> {
        self.song(id)
            .map(CatalogEntry::Melody)
            .or_else(|| self.pattern(id).map(CatalogEntry::Pattern))
    }

    /// Append entries from another catalog, skipping ids already present
    pub fn merge(&mut self, other: Catalog) {
        for song in other.songs {
            if self.song(&song.id).is_none() {
                self.songs.push(song);
            }
        }
        for pattern in other.patterns {
            if self.pattern(&pattern.id).is_none() {
                self.patterns.push(pattern);
            }
        }
    }
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| Catalog {
    songs: builtin_songs(),
    patterns: builtin_patterns(),
});

/// Catalog shipped with the trainer
pub fn builtin_catalog() -> &'static Catalog {
    &BUILTIN
}

// n(string, fret, beats) / r(beats) keep the note tables readable.
// Strings are tablature numbers (1 = high e); both helpers only ever see
// literals below.
fn n(string: u8, fret: u8, beats: f64) -> NoteEvent {
    NoteEvent::Note {
        string: GuitarString::from_number(string).unwrap_or(GuitarString::LowE),
        fret,
        beats,
    }
}

fn r(beats: f64) -> NoteEvent {
    NoteEvent::Rest { beats }
}

fn song(
    id: &str,
    title: &str,
    artist: Option<&str>,
    difficulty: Difficulty,
    bpm: f64,
    description: &str,
    notes: Vec<NoteEvent>,
) -> Song {
    Song {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.map(str::to_string),
        difficulty,
        bpm,
        description: description.to_string(),
        notes,
    }
}

fn builtin_songs() -> Vec<Song> {
    vec![
        // D string: D-F-G | D-F-Ab-G | D-F-G-F-D
        song(
            "smoke-on-the-water",
            "Smoke on the Water",
            Some("Deep Purple"),
            Difficulty::Beginner,
            112.0,
            "The iconic 3-note riff on the D string.",
            vec![
                n(4, 0, 1.0),
                n(4, 3, 0.5),
                n(4, 5, 2.5),
                r(1.0),
                n(4, 0, 1.0),
                n(4, 3, 0.5),
                n(4, 6, 0.5),
                n(4, 5, 2.5),
                r(0.5),
                n(4, 0, 1.0),
                n(4, 3, 0.5),
                n(4, 5, 1.0),
                n(4, 3, 0.5),
                n(4, 0, 3.0),
            ],
        ),
        // D major across strings 2-4
        song(
            "happy-birthday",
            "Happy Birthday",
            None,
            Difficulty::Beginner,
            100.0,
            "The birthday melody in D major, good for learning to cross strings.",
            vec![
                n(4, 0, 0.75),
                n(4, 0, 0.25),
                n(4, 2, 1.0),
                n(4, 0, 1.0),
                n(3, 0, 1.0),
                n(4, 4, 2.0),
                n(4, 0, 0.75),
                n(4, 0, 0.25),
                n(4, 2, 1.0),
                n(4, 0, 1.0),
                n(3, 2, 1.0),
                n(3, 0, 2.0),
                n(4, 0, 0.75),
                n(4, 0, 0.25),
                n(2, 3, 1.0),
                n(2, 0, 1.0),
                n(3, 0, 1.0),
                n(4, 4, 0.5),
                n(4, 2, 1.5),
                n(2, 2, 0.75),
                n(2, 2, 0.25),
                n(2, 0, 1.0),
                n(3, 0, 1.0),
                n(3, 2, 1.0),
                n(3, 0, 3.0),
            ],
        ),
        // A string: E-E-G-E-D-C-B
        song(
            "seven-nation-army",
            "Seven Nation Army",
            Some("The White Stripes"),
            Difficulty::Beginner,
            124.0,
            "The riff on the A string.",
            vec![
                n(5, 7, 2.0),
                n(5, 7, 0.5),
                n(5, 10, 0.5),
                n(5, 7, 1.0),
                n(5, 5, 0.5),
                n(5, 3, 0.5),
                n(5, 2, 2.0),
                r(1.0),
                n(5, 7, 2.0),
                n(5, 7, 0.5),
                n(5, 10, 0.5),
                n(5, 7, 1.0),
                n(5, 6, 0.5),
                n(5, 7, 2.5),
            ],
        ),
        // C major on the two highest strings, natural F at fret 1
        song(
            "ode-to-joy",
            "Ode to Joy",
            Some("Beethoven"),
            Difficulty::Beginner,
            96.0,
            "Beethoven's melody on the high e and B strings.",
            vec![
                n(1, 0, 1.0),
                n(1, 0, 1.0),
                n(1, 1, 1.0),
                n(1, 3, 1.0),
                n(1, 3, 1.0),
                n(1, 1, 1.0),
                n(1, 0, 1.0),
                n(2, 3, 1.0),
                n(2, 1, 1.0),
                n(2, 1, 1.0),
                n(2, 3, 1.0),
                n(1, 0, 1.0),
                n(1, 0, 1.5),
                n(2, 3, 0.5),
                n(2, 3, 2.0),
                r(1.0),
                n(1, 0, 1.0),
                n(1, 0, 1.0),
                n(1, 1, 1.0),
                n(1, 3, 1.0),
                n(1, 3, 1.0),
                n(1, 1, 1.0),
                n(1, 0, 1.0),
                n(2, 3, 1.0),
                n(2, 1, 1.0),
                n(2, 1, 1.0),
                n(2, 3, 1.0),
                n(1, 0, 1.0),
                n(2, 3, 1.5),
                n(2, 1, 0.5),
                n(2, 1, 2.0),
            ],
        ),
        // D blues descending from D4
        song(
            "sunshine-of-your-love",
            "Sunshine of Your Love",
            Some("Cream"),
            Difficulty::Intermediate,
            114.0,
            "Bluesy riff that starts on D4 and descends through the D blues scale.",
            vec![
                n(4, 12, 2.0),
                n(4, 11, 1.0),
                n(5, 12, 1.0),
                n(5, 10, 1.0),
                n(5, 9, 1.0),
                n(5, 10, 2.0),
                r(1.0),
                n(5, 7, 2.0),
                n(5, 9, 1.0),
                n(5, 7, 1.0),
                n(5, 5, 1.0),
                n(5, 7, 3.0),
            ],
        ),
        // G-G-Bb-G-F-Eb-C on the middle strings
        song(
            "eye-of-the-tiger",
            "Eye of the Tiger",
            Some("Survivor"),
            Difficulty::Intermediate,
            108.0,
            "The power riff reduced to single notes.",
            vec![
                n(3, 0, 0.5),
                n(3, 0, 0.5),
                n(3, 3, 1.0),
                n(3, 0, 1.0),
                n(4, 3, 0.5),
                n(4, 1, 0.5),
                n(5, 3, 2.0),
                r(1.0),
                n(3, 0, 0.5),
                n(3, 0, 0.5),
                n(3, 3, 1.0),
                n(3, 0, 1.0),
                n(4, 1, 0.5),
                n(3, 0, 2.5),
            ],
        ),
    ]
}

fn pattern(
    id: &str,
    title: &str,
    chord_name: &str,
    difficulty: Difficulty,
    bpm: f64,
    description: &str,
    steps: &[(u8, f64)],
) -> FingerpickPattern {
    FingerpickPattern {
        id: id.to_string(),
        title: title.to_string(),
        chord_name: chord_name.to_string(),
        difficulty,
        bpm,
        loops: default_pattern_loops(),
        description: description.to_string(),
        sequence: steps
            .iter()
            .filter_map(|(string, beats)| {
                GuitarString::from_number(*string).map(|string| PickStep {
                    string,
                    beats: *beats,
                })
            })
            .collect(),
    }
}

fn builtin_patterns() -> Vec<FingerpickPattern> {
    vec![
        pattern(
            "em-arpeggio",
            "Em Arpeggio",
            "Em",
            Difficulty::Beginner,
            70.0,
            "Six-string arpeggio: thumb on the bass, fingers roll up through the treble.",
            &[(6, 1.0), (4, 1.0), (3, 1.0), (2, 1.0), (1, 1.0), (2, 1.0)],
        ),
        pattern(
            "am-travis-pick",
            "Am Travis Pick",
            "Am",
            Difficulty::Intermediate,
            80.0,
            "Alternating bass on the 5th and 4th strings under a plucked melody.",
            &[
                (5, 0.5),
                (2, 0.5),
                (4, 0.5),
                (3, 0.5),
                (5, 0.5),
                (1, 0.5),
                (4, 0.5),
                (2, 0.5),
            ],
        ),
        pattern(
            "g-major-pattern",
            "G Major Pattern",
            "G",
            Difficulty::Beginner,
            75.0,
            "Bass note, then up through the chord.",
            &[(6, 1.0), (3, 1.0), (2, 1.0), (1, 1.0)],
        ),
        pattern(
            "c-major-waltz",
            "C Major Waltz",
            "C",
            Difficulty::Beginner,
            90.0,
            "Waltz feel in 3/4: bass then two treble strings.",
            &[(5, 1.0), (2, 1.0), (1, 1.0)],
        ),
    ]
}
