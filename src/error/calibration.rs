// Calibration error types and constants

use crate::error::ErrorCode;
use std::fmt;
use tracing::error;

/// Calibration error code constants
///
/// Error code range: 2001-2003
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// A frame was offered for calibration while no calibration is running
    pub const NOT_CALIBRATING: i32 = 2001;

    /// A noise floor was requested before calibration completed
    pub const NOT_CALIBRATED: i32 = 2002;

    /// Calibration window length is zero
    pub const INVALID_WINDOW: i32 = 2003;
}

/// Log a calibration error with structured context
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=NoiseFloorCalibrator, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Not in the calibrating state
    NotCalibrating,

    /// No noise floor has been captured yet
    NotCalibrated,

    /// Calibration window must hold at least one frame
    InvalidWindow { frames: usize },
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::NotCalibrating => CalibrationErrorCodes::NOT_CALIBRATING,
            CalibrationError::NotCalibrated => CalibrationErrorCodes::NOT_CALIBRATED,
            CalibrationError::InvalidWindow { .. } => CalibrationErrorCodes::INVALID_WINDOW,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::NotCalibrating => "Calibration not in progress".to_string(),
            CalibrationError::NotCalibrated => "Noise floor not calibrated".to_string(),
            CalibrationError::InvalidWindow { frames } => {
                format!("Calibration window must be > 0 frames (got {})", frames)
            }
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}
