//! Timed blocks and schedule expansion
//!
//! A run expands its target sequence into a flat list of blocks, each with
//! an absolute arrival time at the hit line:
//!
//! ```text
//! arrival_ms = travel_duration_ms + beats_elapsed * (60000 / bpm)
//! ```
//!
//! Chord progressions and picking patterns repeat back to back. Melodies
//! skip rests (a rest only advances time) and leave a short gap after each
//! pass so the learner can reset their hand.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::HighwayConfig;
use crate::error::SessionError;
use crate::theory::{
    chord, fret_to_note_name, FingerpickPattern, GuitarString, NoteEvent, PickStep, Song, MAX_FRET,
};

/// One chord of a progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordStep {
    pub chord: String,
    pub beats: f64,
}

impl ChordStep {
    pub fn new(chord: impl Into<String>, beats: f64) -> Self {
        Self {
            chord: chord.into(),
            beats,
        }
    }
}

/// What a run asks the learner to play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "steps", rename_all = "lowercase")]
pub enum TargetSequence {
    Progression(Vec<ChordStep>),
    Melody(Vec<NoteEvent>),
    Pattern(Vec<PickStep>),
}

/// Which detector and hit window a sequence uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceKind {
    Chords,
    Notes,
}

impl TargetSequence {
    pub fn from_song(song: &Song) -> Self {
        TargetSequence::Melody(song.notes.clone())
    }

    pub fn from_pattern(pattern: &FingerpickPattern) -> Self {
        TargetSequence::Pattern(pattern.sequence.clone())
    }

    pub fn kind(&self) -> SequenceKind {
        match self {
            TargetSequence::Progression(_) => SequenceKind::Chords,
            TargetSequence::Melody(_) | TargetSequence::Pattern(_) => SequenceKind::Notes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TargetSequence::Progression(steps) => steps.len(),
            TargetSequence::Melody(events) => events.len(),
            TargetSequence::Pattern(steps) => steps.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loop count used when the caller does not pick one
    pub fn default_loops(&self, config: &HighwayConfig) -> u32 {
        match self {
            TargetSequence::Progression(_) => config.chord_loops,
            TargetSequence::Melody(_) => config.melody_loops,
            TargetSequence::Pattern(_) => config.pattern_loops,
        }
    }

    /// Check every entry: positive finite durations, known chords, frets on the board
    pub fn validate(&self) -> Result<(), SessionError> {
        let check_beats = |index: usize, beats: f64| {
            if beats.is_finite() && beats > 0.0 {
                Ok(())
            } else {
                Err(SessionError::DurationInvalid { index, beats })
            }
        };

        match self {
            TargetSequence::Progression(steps) => {
                for (index, step) in steps.iter().enumerate() {
                    check_beats(index, step.beats)?;
                    if chord(&step.chord).is_none() {
                        return Err(SessionError::UnknownChord {
                            name: step.chord.clone(),
                        });
                    }
                }
            }
            TargetSequence::Melody(events) => {
                for (index, event) in events.iter().enumerate() {
                    check_beats(index, event.beats())?;
                    if let NoteEvent::Note { fret, .. } = event {
                        if *fret > MAX_FRET {
                            return Err(SessionError::FretOutOfRange {
                                fret: *fret,
                                max_fret: MAX_FRET,
                            });
                        }
                    }
                }
            }
            TargetSequence::Pattern(steps) => {
                for (index, step) in steps.iter().enumerate() {
                    check_beats(index, step.beats)?;
                }
            }
        }
        Ok(())
    }
}

/// The expected sound of one block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockTarget {
    Chord { name: String },
    Note { string: GuitarString, fret: u8 },
    /// Pattern step: any fret on this string
    PickString { string: GuitarString },
}

impl fmt::Display for BlockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTarget::Chord { name } => write!(f, "{}", name),
            BlockTarget::Note { string, fret } => {
                write!(f, "{} ({}:{})", fret_to_note_name(*string, *fret), string, fret)
            }
            BlockTarget::PickString { string } => {
                write!(f, "string {} ({})", string.number(), string)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    Scheduled,
    Hit,
    Missed,
    PendingRetry,
}

/// One scheduled target inside a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedBlock {
    /// Position in the expanded schedule
    pub id: usize,
    /// Which repetition of the sequence this block belongs to
    pub loop_index: u32,
    pub target: BlockTarget,
    pub beats: f64,
    /// Game time at which the block reaches the hit line
    pub arrival_ms: f64,
    pub duration_ms: f64,
    pub status: BlockStatus,
}

impl TimedBlock {
    /// Signed time until the hit line; negative once passed
    pub fn time_to_hit(&self, game_time_ms: f64) -> f64 {
        self.arrival_ms - game_time_ms
    }

    /// Scheduled blocks are the only ones still open to hit/miss decisions
    pub fn is_unresolved(&self) -> bool {
        self.status == BlockStatus::Scheduled
    }

    pub fn end_ms(&self) -> f64 {
        self.arrival_ms + self.duration_ms
    }
}

/// Milliseconds per beat
pub fn beat_ms(bpm: f64) -> f64 {
    60_000.0 / bpm
}

/// Expand a sequence into timed blocks
///
/// # Errors
/// - `BpmInvalid` for a non-finite or non-positive tempo
/// - `LoopCountInvalid` for zero loops
/// - any error from [`TargetSequence::validate`]
///
/// An empty sequence expands to no blocks.
pub fn expand(
    sequence: &TargetSequence,
    bpm: f64,
    loops: u32,
    config: &HighwayConfig,
) -> Result<Vec<TimedBlock>, SessionError> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(SessionError::BpmInvalid { bpm });
    }
    if loops == 0 {
        return Err(SessionError::LoopCountInvalid { loops });
    }
    sequence.validate()?;

    let beat = beat_ms(bpm);
    let mut blocks = Vec::new();
    let mut beats_elapsed = 0.0;

    let push = |blocks: &mut Vec<TimedBlock>, loop_index, target, beats: f64, at: f64| {
        blocks.push(TimedBlock {
            id: blocks.len(),
            loop_index,
            target,
            beats,
            arrival_ms: config.travel_duration_ms + at * beat,
            duration_ms: beats * beat,
            status: BlockStatus::Scheduled,
        });
    };

    for loop_index in 0..loops {
        match sequence {
            TargetSequence::Progression(steps) => {
                for step in steps {
                    let target = BlockTarget::Chord {
                        name: step.chord.clone(),
                    };
                    push(&mut blocks, loop_index, target, step.beats, beats_elapsed);
                    beats_elapsed += step.beats;
                }
            }
            TargetSequence::Melody(events) => {
                for event in events {
                    if let NoteEvent::Note { string, fret, beats } = *event {
                        let target = BlockTarget::Note { string, fret };
                        push(&mut blocks, loop_index, target, beats, beats_elapsed);
                    }
                    beats_elapsed += event.beats();
                }
                beats_elapsed += config.melody_loop_gap_beats;
            }
            TargetSequence::Pattern(steps) => {
                for step in steps {
                    let target = BlockTarget::PickString {
                        string: step.string,
                    };
                    push(&mut blocks, loop_index, target, step.beats, beats_elapsed);
                    beats_elapsed += step.beats;
                }
            }
        }
    }

    Ok(blocks)
}

/// Game time at which the last block ends (travel time alone for no blocks)
pub fn run_duration_ms(blocks: &[TimedBlock], travel_duration_ms: f64) -> f64 {
    blocks
        .iter()
        .map(TimedBlock::end_ms)
        .fold(travel_duration_ms, f64::max)
}
