// Temporal module - time-domain level and frame assembly

/// Root-mean-square amplitude of a window (0.0 for empty input)
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Slices an arbitrary stream of sample chunks into fixed analysis windows
///
/// Audio arrives in whatever block size the device or file reader delivers.
/// Analysis needs windows of exactly `window_size` samples, advanced by
/// `hop_size` each time. A hop equal to the window gives back-to-back
/// frames; a smaller hop gives overlapping frames.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    window_size: usize,
    hop_size: usize,
    pending: Vec<f32>,
}

impl FrameAssembler {
    /// Create an assembler. `hop_size` is clamped to `1..=window_size`.
    pub fn new(window_size: usize, hop_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            window_size,
            hop_size: hop_size.clamp(1, window_size),
            pending: Vec::with_capacity(window_size * 2),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Append samples and return every window that became complete
    pub fn push(&mut self, chunk: &[f32]) -> Vec<Vec<f32>> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while self.pending.len() >= self.window_size {
            frames.push(self.pending[..self.window_size].to_vec());
            self.pending.drain(..self.hop_size);
        }
        frames
    }

    /// Samples waiting for the next window
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
