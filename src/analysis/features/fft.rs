// FFT module - windowed forward transforms
//
// Hann windowing keeps spectral leakage from smearing energy across
// neighbouring pitch classes. Plans are built once per processor and reused
// for every frame.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Precomputed Hann window of `size` samples
pub fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - ((2.0 * std::f32::consts::PI * i as f32) / (size as f32 - 1.0)).cos())
        })
        .collect()
}

/// FFT processor that computes magnitude spectra from audio windows
pub struct FftProcessor {
    forward: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
}

impl FftProcessor {
    /// Create a new FFT processor
    ///
    /// # Arguments
    /// * `fft_size` - FFT window size (4096 for chroma analysis)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(fft_size),
            fft_size,
            window: hann_window(fft_size),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Centre frequency of a spectrum bin
    pub fn bin_frequency(&self, bin: usize, sample_rate: u32) -> f32 {
        bin as f32 * sample_rate as f32 / self.fft_size as f32
    }

    /// Compute magnitude spectrum using FFT
    ///
    /// Applies Hann windowing, performs FFT, and returns magnitudes for the
    /// non-negative frequencies only. Short input is zero-padded; samples
    /// past `fft_size` are ignored.
    ///
    /// # Returns
    /// Magnitude spectrum (size = fft_size / 2 + 1)
    pub fn compute_magnitude_spectrum(&self, audio: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = audio
            .iter()
            .zip(self.window.iter())
            .map(|(sample, w)| Complex::new(sample * w, 0.0))
            .collect();
        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        self.forward.process(&mut buffer);

        buffer[..self.fft_size / 2 + 1]
            .iter()
            .map(|c| c.norm())
            .collect()
    }
}
