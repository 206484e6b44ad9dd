//! Configuration management for detection and highway tuning
//!
//! Thresholds, window sizes and timing constants all live here so they can be
//! adjusted from a JSON file without recompiling. Every field has a default,
//! and a partially specified file only overrides the fields it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chord_detection: ChordDetectionConfig,
    pub note_detection: NoteDetectionConfig,
    pub tuner: TunerConfig,
    pub highway: HighwayConfig,
    pub flashcard: FlashcardConfig,
}

/// Chroma pipeline parameters (calibrator, smoother, matcher)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChordDetectionConfig {
    /// Analysis window size in samples
    pub buffer_size: usize,
    /// Number of chroma frames averaged by the smoother
    pub rolling_window: usize,
    /// Minimum cosine similarity for a chord to be reported
    pub detection_threshold: f32,
    /// Frames averaged to build the noise floor (~2.3 s at 44.1 kHz / 4096)
    pub calibration_frames: usize,
    /// Lowest spectral bin folded into chroma
    pub min_frequency_hz: f32,
    /// Highest spectral bin folded into chroma
    pub max_frequency_hz: f32,
}

impl Default for ChordDetectionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            rolling_window: 15,
            detection_threshold: 0.55,
            calibration_frames: 25,
            min_frequency_hz: 60.0,
            max_frequency_hz: 5000.0,
        }
    }
}

/// Monophonic note resolver parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteDetectionConfig {
    /// Time-domain window; 4096 keeps several periods of low E in view
    pub buffer_size: usize,
    /// Samples between successive pitch estimates
    pub hop_size: usize,
    /// Minimum pitch clarity
    pub clarity_threshold: f32,
    /// Silence gate on window RMS
    pub rms_threshold: f32,
    /// Exclusive lower frequency bound
    pub min_frequency_hz: f32,
    /// Exclusive upper frequency bound
    pub max_frequency_hz: f32,
    /// Maximum distance in semitones between the observed pitch and a fret
    pub fret_tolerance_semitones: f64,
    /// Highest fret searched
    pub max_fret: u8,
    /// How long a valid match is re-emitted across a dropout
    pub hold_ms: f64,
}

impl Default for NoteDetectionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            hop_size: 1024,
            clarity_threshold: 0.88,
            rms_threshold: 0.005,
            min_frequency_hz: 70.0,
            max_frequency_hz: 1050.0,
            fret_tolerance_semitones: 0.45,
            max_fret: crate::theory::MAX_FRET,
            hold_ms: 120.0,
        }
    }
}

/// Tuner display parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    pub buffer_size: usize,
    pub clarity_threshold: f32,
    pub min_frequency_hz: f32,
    pub max_frequency_hz: f32,
    /// |cents| below this is in tune
    pub in_tune_cents: f64,
    /// |cents| below this is close
    pub close_cents: f64,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            buffer_size: 2048,
            clarity_threshold: 0.95,
            min_frequency_hz: 60.0,
            max_frequency_hz: 400.0,
            in_tune_cents: 5.0,
            close_cents: 15.0,
        }
    }
}

/// Scheduler timing and scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighwayConfig {
    /// Lead time between a block appearing and reaching the hit line
    pub travel_duration_ms: f64,
    /// Symmetric window for chord blocks
    pub chord_hit_window_ms: f64,
    /// How early a note may be played
    pub note_hit_window_early_ms: f64,
    /// How late a note may be played
    pub note_hit_window_late_ms: f64,
    /// Wall-clock gap required between two hits
    pub min_hit_gap_ms: f64,
    pub chord_loops: u32,
    pub melody_loops: u32,
    /// Silent beats inserted after every melody loop
    pub melody_loop_gap_beats: f64,
    pub pattern_loops: u32,
    /// Points awarded per hit
    pub hit_score: u32,
}

impl Default for HighwayConfig {
    fn default() -> Self {
        Self {
            travel_duration_ms: 4000.0,
            chord_hit_window_ms: 1200.0,
            note_hit_window_early_ms: 150.0,
            note_hit_window_late_ms: 450.0,
            min_hit_gap_ms: 150.0,
            chord_loops: 4,
            melody_loops: 2,
            melody_loop_gap_beats: 2.0,
            pattern_loops: 4,
            hit_score: 10,
        }
    }
}

/// Single-chord drill parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashcardConfig {
    /// How long the chord must be held to confirm
    pub hold_duration_ms: f64,
    /// Dropouts shorter than this pause the hold instead of resetting it
    pub grace_ms: f64,
}

impl Default for FlashcardConfig {
    fn default() -> Self {
        Self {
            hold_duration_ms: 1500.0,
            grace_ms: 700.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// its JSON is invalid. Failures are logged, never returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/trainer_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chord_detection.rolling_window, 15);
        assert_eq!(config.chord_detection.calibration_frames, 25);
        assert!((config.chord_detection.detection_threshold - 0.55).abs() < 1e-6);
        assert!((config.note_detection.clarity_threshold - 0.88).abs() < 1e-6);
        assert_eq!(config.note_detection.max_fret, 22);
        assert_eq!(config.highway.travel_duration_ms, 4000.0);
        assert_eq!(config.highway.hit_score, 10);
        assert_eq!(config.flashcard.hold_duration_ms, 1500.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(
            parsed.highway.note_hit_window_late_ms,
            config.highway.note_hit_window_late_ms
        );
        assert_eq!(
            parsed.note_detection.buffer_size,
            config.note_detection.buffer_size
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"highway": {"chord_loops": 2}}"#).unwrap();
        assert_eq!(parsed.highway.chord_loops, 2);
        assert_eq!(parsed.highway.travel_duration_ms, 4000.0);
        assert_eq!(parsed.tuner.buffer_size, 2048);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/trainer_config.json");
        assert_eq!(config.chord_detection.buffer_size, 4096);
    }
}
