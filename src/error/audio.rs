// Audio error types and constants

use crate::error::ErrorCode;
use std::fmt;
use tracing::error;

/// Audio error code constants
///
/// Single source of truth for the numeric codes reported by [`AudioError`].
///
/// Error code range: 1001-1008
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// No default input device is available
    pub const NO_INPUT_DEVICE: i32 = 1001;

    /// Failed to open audio stream
    pub const STREAM_OPEN_FAILED: i32 = 1002;

    /// Stream failed after it was opened
    pub const STREAM_FAILURE: i32 = 1003;

    /// Microphone permission denied
    pub const PERMISSION_DENIED: i32 = 1004;

    /// Device delivers a sample format the engine cannot consume
    pub const UNSUPPORTED_FORMAT: i32 = 1005;

    /// A fixture (WAV file or synthetic spec) could not be loaded
    pub const FIXTURE_LOAD_FAILED: i32 = 1006;

    /// Live input already running
    pub const ALREADY_RUNNING: i32 = 1007;

    /// Live input not running
    pub const NOT_RUNNING: i32 = 1008;
}

/// Log an audio error with structured context
///
/// Logs the numeric code, the component and the message so the error can be
/// correlated with telemetry. Never panics.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioInput, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These cover the live input stream and fixture sources. The detection core
/// never sees them: a failed stream simply produces no frames.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No default input device found
    NoInputDevice,

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Stream failed after being opened
    StreamFailure { reason: String },

    /// Microphone permission denied
    PermissionDenied,

    /// Unsupported device sample format
    UnsupportedFormat { format: String },

    /// Fixture could not be loaded
    FixtureLoadFailed { reason: String },

    /// Live input already running
    AlreadyRunning,

    /// Live input not running
    NotRunning,
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::NoInputDevice => AudioErrorCodes::NO_INPUT_DEVICE,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::StreamFailure { .. } => AudioErrorCodes::STREAM_FAILURE,
            AudioError::PermissionDenied => AudioErrorCodes::PERMISSION_DENIED,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
            AudioError::FixtureLoadFailed { .. } => AudioErrorCodes::FIXTURE_LOAD_FAILED,
            AudioError::AlreadyRunning => AudioErrorCodes::ALREADY_RUNNING,
            AudioError::NotRunning => AudioErrorCodes::NOT_RUNNING,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::NoInputDevice => "No default input device found".to_string(),
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::StreamFailure { reason } => format!("Audio stream failure: {}", reason),
            AudioError::PermissionDenied => "Microphone permission denied".to_string(),
            AudioError::UnsupportedFormat { format } => {
                format!("Unsupported sample format: {}", format)
            }
            AudioError::FixtureLoadFailed { reason } => {
                format!("Failed to load fixture: {}", reason)
            }
            AudioError::AlreadyRunning => {
                "Live input already running. Call stop() first.".to_string()
            }
            AudioError::NotRunning => "Live input not running. Call start() first.".to_string(),
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

/// Convert from std::io::Error to AudioError
impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::FixtureLoadFailed {
            reason: err.to_string(),
        }
    }
}
