//! Highway - timed event scheduling for practice and test runs
//!
//! Targets scroll toward a hit line; each must be played while it is inside
//! its timing window. Module organization:
//! - clock: game time with freeze/resume
//! - block: timed blocks and schedule expansion
//! - judge: live match type, target matching and hit windows
//! - scheduler: the run state machine
//! - score: score events, score board and session summary

pub mod block;
pub mod clock;
pub mod judge;
pub mod scheduler;
pub mod score;

use serde::{Deserialize, Serialize};

pub use block::{
    beat_ms, expand, run_duration_ms, BlockStatus, BlockTarget, ChordStep, SequenceKind,
    TargetSequence, TimedBlock,
};
pub use clock::GameClock;
pub use judge::{target_matches, HitWindow, LiveMatch};
pub use scheduler::{HighwayScheduler, Tick};
pub use score::{ScoreBoard, ScoreEvent, SessionSummary};

/// What happens when a block passes unplayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeMode {
    /// Freeze and wait for the learner to play it
    #[default]
    Practice,
    /// Count a miss and keep scrolling
    Test,
}

impl std::str::FromStr for PracticeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "practice" => Ok(PracticeMode::Practice),
            "test" => Ok(PracticeMode::Test),
            other => Err(format!("unknown mode '{}' (expected practice or test)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Stopped,
    Running,
    PausedForRetry,
}
