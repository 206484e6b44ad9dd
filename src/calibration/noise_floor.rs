// NoiseFloorCalibrator - per-pitch-class ambient energy baseline
//
// The calibrator listens to the room for a fixed number of chroma frames,
// averages them bin by bin, and freezes the result as the noise floor.
// Every later frame has the floor subtracted, clamped at zero.
//
// Lifecycle:
//   Uncalibrated --start_calibration--> Calibrating --window full--> Calibrated
//   any state --start_calibration--> Calibrating (previous floor discarded)
//   any state --reset--> Uncalibrated (stream lost)

use super::progress::{CalibrationPhase, CalibrationProgress};
use crate::analysis::{ChromaVector, PITCH_CLASSES};
use crate::config::ChordDetectionConfig;
use crate::error::CalibrationError;

/// Result of offering one frame to the calibrator
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationStep {
    /// Frame consumed, window not full yet
    Collecting { collected: usize, needed: usize },
    /// Window filled; the new floor is active
    Completed(ChromaVector),
}

/// Noise floor calibrator for the chroma pipeline
#[derive(Debug, Clone)]
pub struct NoiseFloorCalibrator {
    frames_needed: usize,
    accumulator: Vec<ChromaVector>,
    noise_floor: ChromaVector,
    phase: CalibrationPhase,
}

impl NoiseFloorCalibrator {
    /// Create a calibrator averaging `frames_needed` frames
    ///
    /// # Errors
    /// `InvalidWindow` if `frames_needed` is zero.
    pub fn new(frames_needed: usize) -> Result<Self, CalibrationError> {
        if frames_needed == 0 {
            return Err(CalibrationError::InvalidWindow {
                frames: frames_needed,
            });
        }

        Ok(Self {
            frames_needed,
            accumulator: Vec::with_capacity(frames_needed),
            noise_floor: [0.0; PITCH_CLASSES],
            phase: CalibrationPhase::Uncalibrated,
        })
    }

    pub fn from_config(config: &ChordDetectionConfig) -> Result<Self, CalibrationError> {
        Self::new(config.calibration_frames)
    }

    /// Begin (or restart) calibration, discarding any previous floor
    pub fn start_calibration(&mut self) {
        self.accumulator.clear();
        self.noise_floor = [0.0; PITCH_CLASSES];
        self.phase = CalibrationPhase::Calibrating;
        tracing::info!(
            "[Calibration] Listening to room for {} frames",
            self.frames_needed
        );
    }

    /// Feed one raw chroma frame into the calibration window
    ///
    /// # Errors
    /// `NotCalibrating` when no calibration is in progress. The frame is
    /// left untouched so the caller can route it to the matcher instead.
    pub fn ingest(&mut self, frame: &ChromaVector) -> Result<CalibrationStep, CalibrationError> {
        if self.phase != CalibrationPhase::Calibrating {
            return Err(CalibrationError::NotCalibrating);
        }

        self.accumulator.push(*frame);
        if self.accumulator.len() < self.frames_needed {
            return Ok(CalibrationStep::Collecting {
                collected: self.accumulator.len(),
                needed: self.frames_needed,
            });
        }

        let mut floor = [0.0f32; PITCH_CLASSES];
        for sample in &self.accumulator {
            for (bin, energy) in floor.iter_mut().zip(sample.iter()) {
                *bin += energy;
            }
        }
        let count = self.accumulator.len() as f32;
        for bin in floor.iter_mut() {
            *bin /= count;
        }

        self.noise_floor = floor;
        self.accumulator.clear();
        self.phase = CalibrationPhase::Calibrated;
        tracing::info!("[Calibration] Noise floor captured: {:?}", floor);

        Ok(CalibrationStep::Completed(floor))
    }

    /// Subtract the floor from a frame, clamping each bin at zero
    ///
    /// Before any calibration the floor is zero and frames pass through
    /// unchanged (apart from clamping negative input).
    pub fn denoise(&self, frame: &ChromaVector) -> ChromaVector {
        let mut out = [0.0f32; PITCH_CLASSES];
        for ((dst, energy), floor) in out.iter_mut().zip(frame.iter()).zip(self.noise_floor.iter())
        {
            *dst = (energy - floor).max(0.0);
        }
        out
    }

    /// Forget the floor entirely (stream disconnected)
    pub fn reset(&mut self) {
        self.accumulator.clear();
        self.noise_floor = [0.0; PITCH_CLASSES];
        self.phase = CalibrationPhase::Uncalibrated;
    }

    /// The frozen floor
    ///
    /// # Errors
    /// `NotCalibrated` until a calibration window has completed.
    pub fn noise_floor(&self) -> Result<&ChromaVector, CalibrationError> {
        match self.phase {
            CalibrationPhase::Calibrated => Ok(&self.noise_floor),
            _ => Err(CalibrationError::NotCalibrated),
        }
    }

    pub fn is_calibrating(&self) -> bool {
        self.phase == CalibrationPhase::Calibrating
    }

    pub fn is_calibrated(&self) -> bool {
        self.phase == CalibrationPhase::Calibrated
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn frames_needed(&self) -> usize {
        self.frames_needed
    }

    pub fn progress(&self) -> CalibrationProgress {
        CalibrationProgress::new(self.phase, self.accumulator.len(), self.frames_needed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: ChromaVector = [0.1, 0.0, 0.3, 0.0, 0.2, 0.0, 0.0, 0.05, 0.0, 0.0, 0.4, 0.0];

    #[test]
    fn test_zero_window_rejected() {
        assert_eq!(
            NoiseFloorCalibrator::new(0).unwrap_err(),
            CalibrationError::InvalidWindow { frames: 0 }
        );
    }

    #[test]
    fn test_ingest_requires_calibrating() {
        let mut cal = NoiseFloorCalibrator::new(3).unwrap();
        assert_eq!(
            cal.ingest(&ROOM).unwrap_err(),
            CalibrationError::NotCalibrating
        );
        assert_eq!(cal.noise_floor().unwrap_err(), CalibrationError::NotCalibrated);
    }

    #[test]
    fn test_constant_input_denoises_to_zero() {
        let mut cal = NoiseFloorCalibrator::new(25).unwrap();
        cal.start_calibration();

        for i in 1..25 {
            assert_eq!(
                cal.ingest(&ROOM).unwrap(),
                CalibrationStep::Collecting {
                    collected: i,
                    needed: 25
                }
            );
        }
        assert!(matches!(
            cal.ingest(&ROOM).unwrap(),
            CalibrationStep::Completed(_)
        ));
        assert!(cal.is_calibrated());
        assert!(!cal.is_calibrating());

        let cleaned = cal.denoise(&ROOM);
        assert!(cleaned.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_floor_is_bin_mean() {
        let mut cal = NoiseFloorCalibrator::new(2).unwrap();
        cal.start_calibration();
        let mut a = [0.0; 12];
        a[0] = 1.0;
        let mut b = [0.0; 12];
        b[0] = 3.0;
        b[5] = 2.0;
        cal.ingest(&a).unwrap();
        cal.ingest(&b).unwrap();

        let floor = cal.noise_floor().unwrap();
        assert!((floor[0] - 2.0).abs() < 1e-6);
        assert!((floor[5] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_denoise_clamps_at_zero() {
        let mut cal = NoiseFloorCalibrator::new(1).unwrap();
        cal.start_calibration();
        cal.ingest(&ROOM).unwrap();

        let quiet = [0.0f32; 12];
        assert_eq!(cal.denoise(&quiet), [0.0; 12]);

        let mut loud = ROOM;
        loud[4] += 1.0;
        let cleaned = cal.denoise(&loud);
        assert!((cleaned[4] - 1.0).abs() < 1e-6);
        assert!(cleaned.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_recalibration_discards_previous_floor() {
        let mut cal = NoiseFloorCalibrator::new(1).unwrap();
        cal.start_calibration();
        cal.ingest(&ROOM).unwrap();

        cal.start_calibration();
        assert!(cal.is_calibrating());
        assert_eq!(cal.denoise(&ROOM), ROOM);
        assert_eq!(cal.progress().frames_collected, 0);

        cal.reset();
        assert_eq!(cal.phase(), CalibrationPhase::Uncalibrated);
    }
}
