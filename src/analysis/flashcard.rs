// Flashcard hold judge - single-chord drill
//
// The learner confirms a chord by holding it for a fixed duration. Short
// dropouts (shorter than the grace period) freeze the progress bar but
// keep the timer running from the original hold start; longer dropouts
// restart the hold.

use serde::Serialize;

use super::ChordMatch;
use crate::config::FlashcardConfig;

/// Confidence reported when a chord was confirmed without any recorded sample
pub const FALLBACK_CONFIDENCE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlashcardStatus {
    /// Target not currently (or not yet) detected
    Waiting,
    /// Target detected, hold in progress
    Holding,
    /// Hold completed; carries the mean confidence while correct
    Confirmed { confidence: f32 },
}

/// Snapshot returned by every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlashcardProgress {
    /// Hold bar fill in [0, 1]
    pub progress: f64,
    pub status: FlashcardStatus,
}

#[derive(Debug, Clone)]
pub struct FlashcardJudge {
    config: FlashcardConfig,
    target: String,
    hold_start: Option<f64>,
    last_correct: f64,
    confidences: Vec<f32>,
    progress: f64,
    confirmed: Option<f32>,
}

impl FlashcardJudge {
    pub fn new(config: FlashcardConfig, target: impl Into<String>) -> Self {
        Self {
            config,
            target: target.into(),
            hold_start: None,
            last_correct: 0.0,
            confidences: Vec::new(),
            progress: 0.0,
            confirmed: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed.is_some()
    }

    /// Switch to a new target chord, discarding all hold state
    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
        self.reset();
    }

    pub fn reset(&mut self) {
        self.hold_start = None;
        self.last_correct = 0.0;
        self.confidences.clear();
        self.progress = 0.0;
        self.confirmed = None;
    }

    /// Evaluate the live detection at `now_ms`
    pub fn tick(&mut self, now_ms: f64, detected: Option<&ChordMatch>) -> FlashcardProgress {
        if let Some(confidence) = self.confirmed {
            return FlashcardProgress {
                progress: 1.0,
                status: FlashcardStatus::Confirmed { confidence },
            };
        }

        let correct = detected.filter(|m| m.chord == self.target);

        match correct {
            Some(m) => {
                self.last_correct = now_ms;
                self.confidences.push(m.confidence);
                let start = *self.hold_start.get_or_insert(now_ms);

                let elapsed = now_ms - start;
                self.progress = (elapsed / self.config.hold_duration_ms).min(1.0);

                if elapsed >= self.config.hold_duration_ms {
                    let confidence = self.mean_confidence();
                    tracing::info!(
                        "[Flashcard] {} confirmed (confidence {:.2})",
                        self.target,
                        confidence
                    );
                    self.confirmed = Some(confidence);
                    return FlashcardProgress {
                        progress: 1.0,
                        status: FlashcardStatus::Confirmed { confidence },
                    };
                }

                FlashcardProgress {
                    progress: self.progress,
                    status: FlashcardStatus::Holding,
                }
            }
            None => {
                if now_ms - self.last_correct > self.config.grace_ms {
                    self.hold_start = None;
                    self.progress = 0.0;
                }
                FlashcardProgress {
                    progress: self.progress,
                    status: FlashcardStatus::Waiting,
                }
            }
        }
    }

    fn mean_confidence(&self) -> f32 {
        if self.confidences.is_empty() {
            return FALLBACK_CONFIDENCE;
        }
        self.confidences.iter().sum::<f32>() / self.confidences.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detected(chord: &str, confidence: f32) -> ChordMatch {
        ChordMatch {
            chord: chord.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_hold_confirms_after_duration() {
        let mut judge = FlashcardJudge::new(FlashcardConfig::default(), "Am");
        let am = detected("Am", 0.8);

        let first = judge.tick(10_000.0, Some(&am));
        assert_eq!(first.status, FlashcardStatus::Holding);
        assert_eq!(first.progress, 0.0);

        let half = judge.tick(10_750.0, Some(&am));
        assert!((half.progress - 0.5).abs() < 1e-9);

        let done = judge.tick(11_500.0, Some(&detected("Am", 0.9)));
        match done.status {
            FlashcardStatus::Confirmed { confidence } => {
                assert!((confidence - (0.8 + 0.8 + 0.9) / 3.0).abs() < 1e-6)
            }
            other => panic!("expected confirmation, got {:?}", other),
        }
        assert!(judge.is_confirmed());

        // Further ticks are ignored
        let after = judge.tick(12_000.0, None);
        assert_eq!(after.progress, 1.0);
        assert!(matches!(after.status, FlashcardStatus::Confirmed { .. }));
    }

    #[test]
    fn test_short_dropout_pauses_but_keeps_timer() {
        let mut judge = FlashcardJudge::new(FlashcardConfig::default(), "G");
        let g = detected("G", 0.7);

        judge.tick(1_000.0, Some(&g));
        judge.tick(1_600.0, Some(&g));
        let dropped = judge.tick(2_000.0, Some(&detected("Em", 0.9)));
        assert_eq!(dropped.status, FlashcardStatus::Waiting);
        assert!((dropped.progress - 0.4).abs() < 1e-9);

        // Timer kept counting from the original start
        let back = judge.tick(2_500.0, Some(&g));
        assert!(matches!(back.status, FlashcardStatus::Confirmed { .. }));
    }

    #[test]
    fn test_long_dropout_resets_hold() {
        let mut judge = FlashcardJudge::new(FlashcardConfig::default(), "D");
        let d = detected("D", 0.6);

        judge.tick(1_000.0, Some(&d));
        judge.tick(1_500.0, Some(&d));
        let gone = judge.tick(2_300.0, None);
        assert_eq!(gone.progress, 0.0);

        let restarted = judge.tick(2_400.0, Some(&d));
        assert_eq!(restarted.progress, 0.0);
        assert!(!judge.is_confirmed());
    }

    #[test]
    fn test_set_target_clears_state() {
        let mut judge = FlashcardJudge::new(FlashcardConfig::default(), "E");
        judge.tick(0.0, Some(&detected("E", 1.0)));
        judge.tick(1_500.0, Some(&detected("E", 1.0)));
        assert!(judge.is_confirmed());

        judge.set_target("A");
        assert_eq!(judge.target(), "A");
        assert!(!judge.is_confirmed());
        let waiting = judge.tick(1_600.0, Some(&detected("E", 1.0)));
        assert_eq!(waiting.status, FlashcardStatus::Waiting);
    }

    #[test]
    fn test_fallback_confidence() {
        let judge = FlashcardJudge::new(FlashcardConfig::default(), "C");
        assert_eq!(judge.mean_confidence(), FALLBACK_CONFIDENCE);
    }
}
