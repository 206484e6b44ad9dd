// Session error types and constants
//
// These are the preconditions a caller must satisfy before a highway run
// starts. The scheduler rejects the request and stays stopped instead of
// running with undefined timing.

use crate::error::ErrorCode;
use std::fmt;
use tracing::error;

/// Session error code constants
///
/// Error code range: 3001-3007
pub struct SessionErrorCodes {}

impl SessionErrorCodes {
    /// Tempo must be finite and > 0
    pub const BPM_INVALID: i32 = 3001;

    /// Loop count must be >= 1
    pub const LOOP_COUNT_INVALID: i32 = 3002;

    /// A target's duration in beats must be finite and > 0
    pub const DURATION_INVALID: i32 = 3003;

    /// Chord name not present in the dictionary
    pub const UNKNOWN_CHORD: i32 = 3004;

    /// Fret number beyond the fretboard
    pub const FRET_OUT_OF_RANGE: i32 = 3005;

    /// Practice/test mode can only change while stopped
    pub const MODE_LOCKED: i32 = 3006;

    /// Operation requires a running session
    pub const NOT_RUNNING: i32 = 3007;
}

/// Log a session error with structured context
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=HighwayScheduler, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors rejected at the scheduler boundary
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Tempo is zero, negative or not finite
    BpmInvalid { bpm: f64 },

    /// Loop count of zero
    LoopCountInvalid { loops: u32 },

    /// Target duration is zero, negative or not finite
    DurationInvalid { index: usize, beats: f64 },

    /// Chord not in the dictionary
    UnknownChord { name: String },

    /// Fret beyond the playable range
    FretOutOfRange { fret: u8, max_fret: u8 },

    /// Mode switch attempted while running
    ModeLocked,

    /// No run in progress
    NotRunning,
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::BpmInvalid { .. } => SessionErrorCodes::BPM_INVALID,
            SessionError::LoopCountInvalid { .. } => SessionErrorCodes::LOOP_COUNT_INVALID,
            SessionError::DurationInvalid { .. } => SessionErrorCodes::DURATION_INVALID,
            SessionError::UnknownChord { .. } => SessionErrorCodes::UNKNOWN_CHORD,
            SessionError::FretOutOfRange { .. } => SessionErrorCodes::FRET_OUT_OF_RANGE,
            SessionError::ModeLocked => SessionErrorCodes::MODE_LOCKED,
            SessionError::NotRunning => SessionErrorCodes::NOT_RUNNING,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::BpmInvalid { bpm } => {
                format!("BPM must be greater than 0 (got {})", bpm)
            }
            SessionError::LoopCountInvalid { loops } => {
                format!("Loop count must be at least 1 (got {})", loops)
            }
            SessionError::DurationInvalid { index, beats } => {
                format!(
                    "Target {} has invalid duration {} beats (must be > 0)",
                    index, beats
                )
            }
            SessionError::UnknownChord { name } => format!("Unknown chord: {}", name),
            SessionError::FretOutOfRange { fret, max_fret } => {
                format!("Fret {} out of range [0, {}]", fret, max_fret)
            }
            SessionError::ModeLocked => {
                "Mode can only change while stopped. Call stop() first.".to_string()
            }
            SessionError::NotRunning => "Session not running. Call start() first.".to_string(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SessionError {}
