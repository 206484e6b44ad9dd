// Calibration module - ambient noise floor for chord detection
//
// The calibration workflow:
// 1. A stream connects (or the user asks) -> start_calibration()
// 2. The next N chroma frames are averaged instead of matched
// 3. The resulting floor is subtracted from every frame until recalibration

pub mod noise_floor;
pub mod progress;

pub use noise_floor::{CalibrationStep, NoiseFloorCalibrator};
pub use progress::{CalibrationPhase, CalibrationProgress};
