// Progress tracking for noise-floor calibration

/// Where the calibrator is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CalibrationPhase {
    /// No floor captured since the stream started (floor is zero)
    Uncalibrated,
    /// Collecting ambient frames; chord matching is suspended
    Calibrating,
    /// Floor frozen and applied to every frame
    Calibrated,
}

impl CalibrationPhase {
    /// Get human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            CalibrationPhase::Uncalibrated => "UNCALIBRATED",
            CalibrationPhase::Calibrating => "LISTENING TO ROOM",
            CalibrationPhase::Calibrated => "CALIBRATED",
        }
    }
}

/// Snapshot of calibration progress for UI and telemetry
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationProgress {
    pub phase: CalibrationPhase,
    /// Frames collected in the current window
    pub frames_collected: usize,
    /// Frames in a full window
    pub frames_needed: usize,
}

impl CalibrationProgress {
    pub fn new(phase: CalibrationPhase, frames_collected: usize, frames_needed: usize) -> Self {
        Self {
            phase,
            frames_collected,
            frames_needed,
        }
    }

    /// Completion in [0, 1]. A calibrated floor reports 1.0.
    pub fn fraction(&self) -> f32 {
        match self.phase {
            CalibrationPhase::Calibrated => 1.0,
            CalibrationPhase::Uncalibrated => 0.0,
            CalibrationPhase::Calibrating if self.frames_needed == 0 => 0.0,
            CalibrationPhase::Calibrating => {
                (self.frames_collected as f32 / self.frames_needed as f32).min(1.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        assert_eq!(
            CalibrationProgress::new(CalibrationPhase::Calibrating, 5, 25).fraction(),
            0.2
        );
        assert_eq!(
            CalibrationProgress::new(CalibrationPhase::Calibrated, 0, 25).fraction(),
            1.0
        );
        assert_eq!(
            CalibrationProgress::new(CalibrationPhase::Uncalibrated, 0, 25).fraction(),
            0.0
        );
    }

    #[test]
    fn test_progress_serialization() {
        let progress = CalibrationProgress::new(CalibrationPhase::Calibrating, 3, 25);
        let json = serde_json::to_string(&progress).unwrap();
        assert!(json.contains("Calibrating"));
        assert!(json.contains("\"frames_needed\":25"));
    }
}
