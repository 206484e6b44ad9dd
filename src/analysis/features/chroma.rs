// Chroma extraction - fold spectral energy onto the 12 pitch classes
//
// Each FFT bin inside the analysed band is mapped to the pitch class of its
// nearest equal-tempered note. The mapping is precomputed, so per-frame work
// is one FFT plus a pass over the spectrum.

use super::fft::FftProcessor;
use crate::analysis::{ChromaVector, PITCH_CLASSES};
use crate::config::ChordDetectionConfig;
use crate::theory::frequency_to_midi;

/// Produces one chroma vector per analysis window
pub struct ChromaExtractor {
    fft: FftProcessor,
    sample_rate: u32,
    /// Pitch class per spectrum bin, `None` outside the band
    bin_classes: Vec<Option<usize>>,
}

impl ChromaExtractor {
    /// Create an extractor
    ///
    /// # Arguments
    /// * `sample_rate` - Input sample rate in Hz
    /// * `fft_size` - Analysis window length
    /// * `min_hz` / `max_hz` - Inclusive band folded into chroma
    pub fn new(sample_rate: u32, fft_size: usize, min_hz: f32, max_hz: f32) -> Self {
        let fft = FftProcessor::new(fft_size);
        let bin_classes = (0..fft_size / 2 + 1)
            .map(|bin| {
                let freq = fft.bin_frequency(bin, sample_rate);
                if bin == 0 || freq < min_hz || freq > max_hz {
                    return None;
                }
                let midi = frequency_to_midi(f64::from(freq)).round() as i64;
                Some(midi.rem_euclid(PITCH_CLASSES as i64) as usize)
            })
            .collect();

        Self {
            fft,
            sample_rate,
            bin_classes,
        }
    }

    pub fn from_config(sample_rate: u32, config: &ChordDetectionConfig) -> Self {
        Self::new(
            sample_rate,
            config.buffer_size,
            config.min_frequency_hz,
            config.max_frequency_hz,
        )
    }

    pub fn window_size(&self) -> usize {
        self.fft.fft_size()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Raw (un-normalised) chroma energy of one window
    pub fn extract(&self, window: &[f32]) -> ChromaVector {
        let spectrum = self.fft.compute_magnitude_spectrum(window);
        let scale = 1.0 / self.fft.fft_size() as f32;

        let mut chroma = [0.0f32; PITCH_CLASSES];
        for (magnitude, class) in spectrum.iter().zip(self.bin_classes.iter()) {
            if let Some(pc) = class {
                chroma[*pc] += magnitude * magnitude * scale;
            }
        }
        chroma
    }
}
