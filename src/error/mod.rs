// Error types for the fret trainer
//
// Recognition ambiguity is never an error: detectors return `None`. These
// types cover the surfaces that can genuinely fail: opening audio input,
// driving calibration out of order, and starting a run with bad inputs.

mod audio;
mod calibration;
mod session;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use session::{log_session_error, SessionError, SessionErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so callers can map failures to UI strings
/// without matching on every variant.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_trait_objects() {
        let audio_err: &dyn ErrorCode = &AudioError::NoInputDevice;
        assert_eq!(audio_err.code(), AudioErrorCodes::NO_INPUT_DEVICE);

        let cal_err: &dyn ErrorCode = &CalibrationError::NotCalibrating;
        assert_eq!(cal_err.code(), CalibrationErrorCodes::NOT_CALIBRATING);

        let session_err: &dyn ErrorCode = &SessionError::ModeLocked;
        assert_eq!(session_err.code(), SessionErrorCodes::MODE_LOCKED);
    }

    #[test]
    fn test_code_ranges_do_not_overlap() {
        assert!((1000..2000).contains(&AudioError::NoInputDevice.code()));
        assert!((2000..3000).contains(&CalibrationError::NotCalibrated.code()));
        assert!((3000..4000).contains(&SessionError::NotRunning.code()));
    }
}
