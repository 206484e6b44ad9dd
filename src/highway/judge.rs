//! Hit policy - what counts as playing a block, and when
//!
//! Matching rules:
//! - chord blocks: detected chord name equals the block's chord
//! - melody notes: detected MIDI within one semitone of the fretted note
//! - pattern steps: detected string equals the block's string, any fret

use serde::{Deserialize, Serialize};

use super::block::{BlockTarget, SequenceKind};
use crate::analysis::{ChordMatch, NoteMatch};
use crate::config::HighwayConfig;
use crate::theory::fretted_midi;

/// The live detection value read by the scheduler each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiveMatch {
    Chord(ChordMatch),
    Note(NoteMatch),
}

impl LiveMatch {
    /// Human-readable label for logs
    pub fn label(&self) -> String {
        match self {
            LiveMatch::Chord(m) => m.chord.clone(),
            LiveMatch::Note(m) => format!("midi {} ({}:{})", m.midi, m.string, m.fret),
        }
    }
}

impl From<ChordMatch> for LiveMatch {
    fn from(m: ChordMatch) -> Self {
        LiveMatch::Chord(m)
    }
}

impl From<NoteMatch> for LiveMatch {
    fn from(m: NoteMatch) -> Self {
        LiveMatch::Note(m)
    }
}

/// Does the live detection satisfy this target?
pub fn target_matches(target: &BlockTarget, live: &LiveMatch) -> bool {
    match (target, live) {
        (BlockTarget::Chord { name }, LiveMatch::Chord(m)) => m.chord == *name,
        (BlockTarget::Note { string, fret }, LiveMatch::Note(m)) => {
            (m.midi - fretted_midi(*string, *fret)).abs() <= 1
        }
        (BlockTarget::PickString { string }, LiveMatch::Note(m)) => m.string == *string,
        _ => false,
    }
}

/// Timing tolerance around the hit line
///
/// `time_to_hit` is positive before the hit line. A block is hittable while
/// `-late_ms < time_to_hit < early_ms`, and has passed once
/// `time_to_hit < -late_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitWindow {
    pub early_ms: f64,
    pub late_ms: f64,
}

impl HitWindow {
    pub fn symmetric(ms: f64) -> Self {
        Self {
            early_ms: ms,
            late_ms: ms,
        }
    }

    /// Chords get a wide symmetric window; notes a tight early/late one
    pub fn for_kind(kind: SequenceKind, config: &HighwayConfig) -> Self {
        match kind {
            SequenceKind::Chords => Self::symmetric(config.chord_hit_window_ms),
            SequenceKind::Notes => Self {
                early_ms: config.note_hit_window_early_ms,
                late_ms: config.note_hit_window_late_ms,
            },
        }
    }

    pub fn contains(&self, time_to_hit: f64) -> bool {
        time_to_hit > -self.late_ms && time_to_hit < self.early_ms
    }

    pub fn has_passed(&self, time_to_hit: f64) -> bool {
        time_to_hit < -self.late_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::GuitarString;

    fn note(midi: i32, string: GuitarString, fret: u8) -> LiveMatch {
        LiveMatch::Note(NoteMatch {
            midi,
            string,
            fret,
            frequency_hz: 0.0,
            clarity: 1.0,
        })
    }

    fn chord(name: &str) -> LiveMatch {
        LiveMatch::Chord(ChordMatch {
            chord: name.to_string(),
            confidence: 0.9,
        })
    }

    #[test]
    fn test_chord_targets_compare_names() {
        let target = BlockTarget::Chord {
            name: "Am".to_string(),
        };
        assert!(target_matches(&target, &chord("Am")));
        assert!(!target_matches(&target, &chord("Am7")));
        assert!(!target_matches(&target, &note(45, GuitarString::A, 0)));
    }

    #[test]
    fn test_note_targets_allow_one_semitone() {
        // D string fret 2 = E3 = MIDI 52
        let target = BlockTarget::Note {
            string: GuitarString::D,
            fret: 2,
        };
        assert!(target_matches(&target, &note(52, GuitarString::D, 2)));
        // Same pitch found on another string still counts
        assert!(target_matches(&target, &note(52, GuitarString::LowE, 12)));
        assert!(target_matches(&target, &note(51, GuitarString::D, 1)));
        assert!(target_matches(&target, &note(53, GuitarString::D, 3)));
        assert!(!target_matches(&target, &note(54, GuitarString::D, 4)));
        assert!(!target_matches(&target, &chord("E")));
    }

    #[test]
    fn test_pick_targets_compare_strings() {
        let target = BlockTarget::PickString {
            string: GuitarString::G,
        };
        assert!(target_matches(&target, &note(55, GuitarString::G, 0)));
        assert!(target_matches(&target, &note(57, GuitarString::G, 2)));
        assert!(!target_matches(&target, &note(55, GuitarString::D, 5)));
    }

    #[test]
    fn test_window_bounds_are_exclusive() {
        let config = HighwayConfig::default();
        let notes = HitWindow::for_kind(SequenceKind::Notes, &config);
        assert!(notes.contains(149.0));
        assert!(!notes.contains(150.0));
        assert!(notes.contains(-449.0));
        assert!(!notes.contains(-450.0));
        assert!(!notes.has_passed(-450.0));
        assert!(notes.has_passed(-450.5));

        let chords = HitWindow::for_kind(SequenceKind::Chords, &config);
        assert!(chords.contains(1_199.0));
        assert!(chords.contains(-1_199.0));
        assert!(chords.has_passed(-1_201.0));
    }
}
