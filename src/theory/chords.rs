// Chord dictionary
//
// Reference chroma vectors are indexed by pitch class:
// C=0, C#=1, D=2, D#=3, E=4, F=5, F#=6, G=7, G#=8, A=9, A#=10, B=11
//
// Fretboard layout uses diagram columns, not tablature numbers: column 1 is
// the low E string (leftmost in a chord box) and column 6 the high e.
// `open_strings[0]` is likewise the low E string.

use serde::Serialize;

/// What a single string does in a chord shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StringState {
    Muted,
    Open,
    Fretted(u8),
}

/// A fretting finger in a chord diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FingerPosition {
    /// Diagram column, 1 = low E .. 6 = high e
    pub column: u8,
    pub fret: u8,
    /// 1 = index .. 4 = pinky
    pub finger: u8,
}

/// One finger laid across several strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Barre {
    pub fret: u8,
    pub from_column: u8,
    pub to_column: u8,
    pub finger: u8,
}

/// Immutable dictionary entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChordTemplate {
    pub name: &'static str,
    pub display_name: &'static str,
    pub chroma: [f32; 12],
    pub open_strings: [StringState; 6],
    pub fingers: &'static [FingerPosition],
    pub barres: &'static [Barre],
    pub start_fret: u8,
}

impl ChordTemplate {
    /// Pitch classes that sound in this chord
    pub fn pitch_classes(&self) -> impl Iterator<Item = usize> + '_ {
        self.chroma
            .iter()
            .enumerate()
            .filter(|(_, energy)| **energy > 0.0)
            .map(|(pc, _)| pc)
    }

    /// Number of strings that are not muted
    pub fn sounding_strings(&self) -> usize {
        self.open_strings
            .iter()
            .filter(|s| **s != StringState::Muted)
            .count()
    }
}

const fn shape(raw: [i8; 6]) -> [StringState; 6] {
    let mut out = [StringState::Muted; 6];
    let mut i = 0;
    while i < 6 {
        out[i] = match raw[i] {
            -1 => StringState::Muted,
            0 => StringState::Open,
            fret => StringState::Fretted(fret as u8),
        };
        i += 1;
    }
    out
}

const fn finger(column: u8, fret: u8, finger: u8) -> FingerPosition {
    FingerPosition {
        column,
        fret,
        finger,
    }
}

/// Full dictionary in curriculum order (easiest first). Matching iterates
/// this order, so it also decides ties.
pub static CHORDS: [ChordTemplate; 18] = [
    ChordTemplate {
        name: "Em",
        display_name: "E Minor",
        chroma: [0., 0., 0., 0., 1., 0., 0., 1., 0., 0., 0., 1.],
        open_strings: shape([0, 2, 2, 0, 0, 0]),
        fingers: &[finger(2, 2, 2), finger(3, 2, 3)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "Am",
        display_name: "A Minor",
        chroma: [1., 0., 0., 0., 1., 0., 0., 0., 0., 1., 0., 0.],
        open_strings: shape([-1, 0, 2, 2, 1, 0]),
        fingers: &[finger(5, 1, 1), finger(3, 2, 2), finger(4, 2, 3)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "E",
        display_name: "E Major",
        chroma: [0., 0., 0., 0., 1., 0., 0., 0., 1., 0., 0., 1.],
        open_strings: shape([0, 2, 2, 1, 0, 0]),
        fingers: &[finger(4, 1, 1), finger(2, 2, 2), finger(3, 2, 3)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "A",
        display_name: "A Major",
        chroma: [0., 1., 0., 0., 1., 0., 0., 0., 0., 1., 0., 0.],
        open_strings: shape([-1, 0, 2, 2, 2, 0]),
        fingers: &[finger(3, 2, 2), finger(4, 2, 3), finger(5, 2, 4)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "D",
        display_name: "D Major",
        chroma: [0., 0., 1., 0., 0., 0., 1., 0., 0., 1., 0., 0.],
        open_strings: shape([-1, -1, 0, 2, 3, 2]),
        fingers: &[finger(4, 2, 1), finger(5, 3, 3), finger(6, 2, 2)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "G",
        display_name: "G Major",
        chroma: [0., 0., 1., 0., 0., 0., 0., 1., 0., 0., 0., 1.],
        open_strings: shape([3, 2, 0, 0, 3, 3]),
        fingers: &[
            finger(2, 2, 1),
            finger(1, 3, 2),
            finger(5, 3, 3),
            finger(6, 3, 4),
        ],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "C",
        display_name: "C Major",
        chroma: [1., 0., 0., 0., 1., 0., 0., 1., 0., 0., 0., 0.],
        open_strings: shape([-1, 3, 2, 0, 1, 0]),
        fingers: &[finger(5, 1, 1), finger(3, 2, 2), finger(2, 3, 3)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "Dm",
        display_name: "D Minor",
        chroma: [0., 0., 1., 0., 0., 1., 0., 0., 0., 1., 0., 0.],
        open_strings: shape([-1, -1, 0, 2, 3, 1]),
        fingers: &[finger(6, 1, 1), finger(4, 2, 2), finger(5, 3, 3)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "F",
        display_name: "F Major",
        chroma: [1., 0., 0., 0., 0., 1., 0., 0., 0., 1., 0., 0.],
        open_strings: shape([1, 3, 3, 2, 1, 1]),
        fingers: &[finger(4, 2, 2), finger(3, 3, 4), finger(2, 3, 3)],
        barres: &[Barre {
            fret: 1,
            from_column: 1,
            to_column: 6,
            finger: 1,
        }],
        start_fret: 1,
    },
    ChordTemplate {
        name: "Em7",
        display_name: "E Minor 7",
        chroma: [0., 0., 1., 0., 1., 0., 0., 1., 0., 0., 0., 1.],
        open_strings: shape([0, 2, 0, 0, 0, 0]),
        fingers: &[finger(2, 2, 2)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "A7",
        display_name: "A Dominant 7",
        chroma: [0., 1., 0., 0., 1., 0., 0., 1., 0., 1., 0., 0.],
        open_strings: shape([-1, 0, 2, 0, 2, 0]),
        fingers: &[finger(3, 2, 2), finger(5, 2, 3)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "E7",
        display_name: "E Dominant 7",
        chroma: [0., 0., 1., 0., 1., 0., 0., 0., 1., 0., 0., 1.],
        open_strings: shape([0, 2, 0, 1, 0, 0]),
        fingers: &[finger(4, 1, 1), finger(2, 2, 2)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "Am7",
        display_name: "A Minor 7",
        chroma: [1., 0., 0., 0., 1., 0., 0., 1., 0., 1., 0., 0.],
        open_strings: shape([-1, 0, 2, 0, 1, 0]),
        fingers: &[finger(5, 1, 1), finger(3, 2, 2)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "D7",
        display_name: "D Dominant 7",
        chroma: [1., 0., 1., 0., 0., 0., 1., 0., 0., 1., 0., 0.],
        open_strings: shape([-1, -1, 0, 2, 1, 2]),
        fingers: &[finger(5, 1, 1), finger(4, 2, 2), finger(6, 2, 3)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "Cmaj7",
        display_name: "C Major 7",
        chroma: [1., 0., 0., 0., 1., 0., 0., 1., 0., 0., 0., 1.],
        open_strings: shape([-1, 3, 2, 0, 0, 0]),
        fingers: &[finger(3, 2, 2), finger(2, 3, 3)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "Fmaj7",
        display_name: "F Major 7",
        chroma: [1., 0., 0., 0., 1., 1., 0., 0., 0., 1., 0., 0.],
        open_strings: shape([-1, -1, 3, 2, 1, 0]),
        fingers: &[finger(5, 1, 1), finger(4, 2, 2), finger(3, 3, 3)],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "B7",
        display_name: "B Dominant 7",
        chroma: [0., 0., 0., 1., 0., 0., 1., 0., 0., 1., 0., 1.],
        open_strings: shape([-1, 2, 1, 2, 0, 2]),
        fingers: &[
            finger(3, 1, 1),
            finger(2, 2, 2),
            finger(4, 2, 3),
            finger(6, 2, 4),
        ],
        barres: &[],
        start_fret: 1,
    },
    ChordTemplate {
        name: "Bm",
        display_name: "B Minor",
        chroma: [0., 0., 1., 0., 0., 0., 1., 0., 0., 0., 0., 1.],
        open_strings: shape([-1, 2, 4, 4, 3, 2]),
        fingers: &[finger(5, 3, 2), finger(4, 4, 3), finger(3, 4, 4)],
        barres: &[Barre {
            fret: 2,
            from_column: 2,
            to_column: 6,
            finger: 1,
        }],
        start_fret: 2,
    },
];

/// Look up a chord by its symbol ("Em", "Cmaj7", ...)
pub fn chord(name: &str) -> Option<&'static ChordTemplate> {
    CHORDS.iter().find(|c| c.name == name)
}

/// Chords in the order they are taught
pub fn curriculum() -> &'static [ChordTemplate] {
    &CHORDS
}

/// Next chord to learn after `current`, or `None` for the last or an unknown chord
pub fn next_chord(current: &str) -> Option<&'static str> {
    let idx = CHORDS.iter().position(|c| c.name == current)?;
    CHORDS.get(idx + 1).map(|c| c.name)
}
