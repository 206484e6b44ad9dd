// McLeod Pitch Method (MPM)
//
// Fundamental frequency plus a clarity score in [0, 1] from a time-domain
// window. The normalized square difference function (NSDF) is
//
//     n(tau) = 2 r(tau) / m(tau)
//
// where r is the autocorrelation (computed through a zero-padded FFT) and
// m(tau) = sum(x[j]^2 + x[j+tau]^2) is updated incrementally. The pitch
// period is the first key maximum whose height reaches KEY_MAXIMUM_CUTOFF of
// the highest key maximum, refined with parabolic interpolation.
//
// Reference: McLeod & Wyvill (2005), "A smarter way to find pitch".

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Fraction of the highest NSDF peak a key maximum must reach
pub const KEY_MAXIMUM_CUTOFF: f32 = 0.9;

/// Dominant frequency and the detector's confidence in it
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PitchEstimate {
    pub frequency_hz: f32,
    /// NSDF value at the chosen peak, clamped to [0, 1]
    pub clarity: f32,
}

/// MPM detector for a fixed window size
pub struct McLeodPitchDetector {
    window_size: usize,
    sample_rate: u32,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl McLeodPitchDetector {
    pub fn new(window_size: usize, sample_rate: u32) -> Self {
        let mut planner = FftPlanner::new();
        let padded = window_size * 2;
        Self {
            window_size,
            sample_rate,
            forward: planner.plan_fft_forward(padded),
            inverse: planner.plan_fft_inverse(padded),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Estimate pitch of one window
    ///
    /// # Returns
    /// `None` for silence, windows of the wrong length, or signals with no
    /// periodic structure.
    pub fn detect(&self, window: &[f32]) -> Option<PitchEstimate> {
        if window.len() != self.window_size || self.window_size < 4 {
            return None;
        }

        let nsdf = self.nsdf(window)?;
        let peaks = key_maxima(&nsdf);
        let highest = peaks.iter().map(|&i| nsdf[i]).fold(f32::MIN, f32::max);
        if highest <= 0.0 {
            return None;
        }

        let threshold = KEY_MAXIMUM_CUTOFF * highest;
        let chosen = peaks.into_iter().find(|&i| nsdf[i] >= threshold)?;
        let (tau, value) = parabolic_peak(&nsdf, chosen);
        if tau <= 0.0 {
            return None;
        }

        Some(PitchEstimate {
            frequency_hz: self.sample_rate as f32 / tau,
            clarity: value.clamp(0.0, 1.0),
        })
    }

    fn nsdf(&self, window: &[f32]) -> Option<Vec<f32>> {
        let n = self.window_size;
        let mut buffer: Vec<Complex<f32>> = window.iter().map(|&x| Complex::new(x, 0.0)).collect();
        buffer.resize(2 * n, Complex::new(0.0, 0.0));

        self.forward.process(&mut buffer);
        for c in buffer.iter_mut() {
            *c = Complex::new(c.norm_sqr(), 0.0);
        }
        self.inverse.process(&mut buffer);

        // rustfft leaves the inverse unnormalised
        let scale = 1.0 / (2 * n) as f32;
        let acf: Vec<f32> = buffer[..n / 2].iter().map(|c| c.re * scale).collect();

        if acf[0] <= f32::EPSILON {
            return None;
        }

        // Lags past n/2 overlap too few samples to be trusted
        let max_lag = n / 2;
        let mut m = 2.0 * f64::from(acf[0]);
        let mut out = Vec::with_capacity(max_lag);
        out.push(1.0);
        for tau in 1..max_lag {
            let head = f64::from(window[tau - 1]);
            let tail = f64::from(window[n - tau]);
            m -= head * head + tail * tail;
            out.push(if m > 0.0 {
                (2.0 * f64::from(acf[tau]) / m) as f32
            } else {
                0.0
            });
        }
        Some(out)
    }
}

/// Highest point of each positive lobe after the first negative crossing
fn key_maxima(nsdf: &[f32]) -> Vec<usize> {
    let mut peaks = Vec::new();
    let mut tau = 1;

    // Skip the lobe around tau = 0
    while tau < nsdf.len() && nsdf[tau] > 0.0 {
        tau += 1;
    }

    let mut current: Option<usize> = None;
    while tau < nsdf.len() - 1 {
        let value = nsdf[tau];
        if value > 0.0 {
            if nsdf[tau] >= nsdf[tau - 1] && nsdf[tau] >= nsdf[tau + 1] {
                match current {
                    Some(best) if nsdf[best] >= value => {}
                    _ => current = Some(tau),
                }
            }
        } else if let Some(best) = current.take() {
            peaks.push(best);
        }
        tau += 1;
    }
    if let Some(best) = current {
        peaks.push(best);
    }
    peaks
}

/// Vertex of the parabola through (i-1, i, i+1)
fn parabolic_peak(values: &[f32], i: usize) -> (f32, f32) {
    if i == 0 || i + 1 >= values.len() {
        return (i as f32, values[i]);
    }
    let (a, b, c) = (values[i - 1], values[i], values[i + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < f32::EPSILON {
        return (i as f32, b);
    }
    let offset = 0.5 * (a - c) / denom;
    (i as f32 + offset, b - 0.25 * (a - c) * offset)
}
