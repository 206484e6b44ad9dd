// ChromagramSmoother - rolling mean over recent chroma frames
//
// A single strum produces a transient-heavy frame. Averaging the last N
// frames gives relative pitch-class energies stable enough for template
// matching, at the cost of roughly N frames of recognition latency.

use std::collections::VecDeque;

use super::{ChromaVector, PITCH_CLASSES};

/// Fixed-capacity rolling average of chroma vectors
#[derive(Debug, Clone)]
pub struct ChromagramSmoother {
    window: VecDeque<ChromaVector>,
    capacity: usize,
}

impl ChromagramSmoother {
    /// Create a smoother holding at most `capacity` frames (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a frame, evict the oldest if over capacity, return the mean
    pub fn push(&mut self, frame: ChromaVector) -> ChromaVector {
        self.window.push_back(frame);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
        self.average()
    }

    /// Mean of the frames currently held (zeros when empty)
    pub fn average(&self) -> ChromaVector {
        let mut avg = [0.0f32; PITCH_CLASSES];
        if self.window.is_empty() {
            return avg;
        }
        for frame in &self.window {
            for (acc, energy) in avg.iter_mut().zip(frame.iter()) {
                *acc += energy;
            }
        }
        let count = self.window.len() as f32;
        for acc in avg.iter_mut() {
            *acc /= count;
        }
        avg
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(pc: usize, value: f32) -> ChromaVector {
        let mut v = [0.0; PITCH_CLASSES];
        v[pc] = value;
        v
    }

    #[test]
    fn test_reset_then_single_push_returns_frame() {
        let mut smoother = ChromagramSmoother::new(15);
        smoother.push(unit(0, 5.0));
        smoother.reset();
        let frame = [0.5, 0.0, 0.25, 0.0, 1.0, 0.0, 0.0, 0.75, 0.0, 0.0, 0.0, 0.125];
        assert_eq!(smoother.push(frame), frame);
    }

    #[test]
    fn test_window_keeps_only_recent_frames() {
        let mut smoother = ChromagramSmoother::new(3);
        smoother.push(unit(0, 100.0));
        smoother.push(unit(1, 3.0));
        smoother.push(unit(1, 3.0));
        let avg = smoother.push(unit(1, 3.0));

        assert_eq!(smoother.len(), 3);
        assert_eq!(avg[0], 0.0);
        assert!((avg[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_window_mean() {
        let mut smoother = ChromagramSmoother::new(15);
        smoother.push(unit(4, 1.0));
        let avg = smoother.push(unit(7, 1.0));
        assert!((avg[4] - 0.5).abs() < 1e-6);
        assert!((avg[7] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_average_is_zero() {
        let smoother = ChromagramSmoother::new(0);
        assert_eq!(smoother.capacity(), 1);
        assert!(smoother.is_empty());
        assert_eq!(smoother.average(), [0.0; PITCH_CLASSES]);
    }
}
