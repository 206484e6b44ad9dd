// Spectral feature extraction backend
//
// Turns PCM windows into the two kinds of frame the recognition layer
// consumes:
// - chroma mode: a 12-element pitch-class energy vector per window
// - pitch mode: dominant frequency + clarity (McLeod), plus window RMS
//
// Module organization:
// - fft: Hann-windowed magnitude spectra (rustfft)
// - chroma: spectrum -> pitch-class energy
// - pitch: McLeod Pitch Method
// - temporal: RMS and fixed-size frame assembly
// - mod.rs: PitchFrameExtractor coordinating pitch + RMS

mod chroma;
mod fft;
mod pitch;
mod temporal;

pub use chroma::ChromaExtractor;
pub use fft::{hann_window, FftProcessor};
pub use pitch::{McLeodPitchDetector, PitchEstimate, KEY_MAXIMUM_CUTOFF};
pub use temporal::{rms, FrameAssembler};

/// One pitch-mode analysis frame
///
/// A frame with no periodic structure reports frequency 0 and clarity 0,
/// which every consumer rejects.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PitchFrame {
    pub frequency_hz: f32,
    pub clarity: f32,
    pub rms: f32,
}

impl PitchFrame {
    pub fn new(frequency_hz: f32, clarity: f32, rms: f32) -> Self {
        Self {
            frequency_hz,
            clarity,
            rms,
        }
    }
}

/// Pitch-mode extractor: McLeod estimate plus silence level per window
pub struct PitchFrameExtractor {
    detector: McLeodPitchDetector,
}

impl PitchFrameExtractor {
    pub fn new(window_size: usize, sample_rate: u32) -> Self {
        Self {
            detector: McLeodPitchDetector::new(window_size, sample_rate),
        }
    }

    pub fn window_size(&self) -> usize {
        self.detector.window_size()
    }

    pub fn extract(&self, window: &[f32]) -> PitchFrame {
        let level = rms(window);
        match self.detector.detect(window) {
            Some(estimate) => PitchFrame::new(estimate.frequency_hz, estimate.clarity, level),
            None => PitchFrame::new(0.0, 0.0, level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_frame_for_tone_and_silence() {
        let extractor = PitchFrameExtractor::new(4096, 44_100);
        let tone: Vec<f32> = (0..4096)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 110.0 * i as f32 / 44_100.0).sin())
            .collect();

        let frame = extractor.extract(&tone);
        assert!((frame.frequency_hz - 110.0).abs() < 1.0);
        assert!(frame.rms > 0.2);

        let silent = extractor.extract(&[0.0; 4096]);
        assert_eq!(silent, PitchFrame::new(0.0, 0.0, 0.0));
    }
}
