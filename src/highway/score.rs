//! Score events and the caller-owned score board

use serde::{Deserialize, Serialize};

use super::block::BlockTarget;
use super::PracticeMode;

/// Emitted by the scheduler whenever a block is judged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub hit: bool,
    pub target: BlockTarget,
    pub block_id: usize,
    /// Game time of the judgement
    pub game_time_ms: f64,
    /// Points awarded (zero for misses)
    pub score_delta: u32,
}

/// End-of-run report handed to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub mode: PracticeMode,
    pub targets_played: u32,
    pub score: u32,
    pub hits: u32,
    pub misses: u32,
    /// Rounded percentage of judged blocks that were hit
    pub accuracy: u32,
}

/// Running score, streak and accuracy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBoard {
    pub score: u32,
    pub hits: u32,
    pub misses: u32,
    pub streak: u32,
    pub best_streak: u32,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &ScoreEvent) {
        if event.hit {
            self.hits += 1;
            self.score += event.score_delta;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.misses += 1;
            self.streak = 0;
        }
    }

    pub fn judged(&self) -> u32 {
        self.hits + self.misses
    }

    /// round(hits / judged * 100), 0 before anything was judged
    pub fn accuracy(&self) -> u32 {
        let judged = self.judged();
        if judged == 0 {
            return 0;
        }
        (f64::from(self.hits) / f64::from(judged) * 100.0).round() as u32
    }

    /// Summary for a finished run; `None` if nothing was judged
    pub fn summary(&self, mode: PracticeMode) -> Option<SessionSummary> {
        if self.judged() == 0 {
            return None;
        }
        Some(SessionSummary {
            mode,
            targets_played: self.judged(),
            score: self.score,
            hits: self.hits,
            misses: self.misses,
            accuracy: self.accuracy(),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(hit: bool) -> ScoreEvent {
        ScoreEvent {
            hit,
            target: BlockTarget::Chord {
                name: "Em".to_string(),
            },
            block_id: 0,
            game_time_ms: 4_000.0,
            score_delta: if hit { 10 } else { 0 },
        }
    }

    #[test]
    fn test_streaks_and_score() {
        let mut board = ScoreBoard::new();
        for hit in [true, true, true, false, true] {
            board.apply(&event(hit));
        }
        assert_eq!(board.score, 40);
        assert_eq!(board.hits, 4);
        assert_eq!(board.misses, 1);
        assert_eq!(board.streak, 1);
        assert_eq!(board.best_streak, 3);
        assert_eq!(board.accuracy(), 80);
    }

    #[test]
    fn test_accuracy_rounds() {
        let mut board = ScoreBoard::new();
        board.apply(&event(true));
        board.apply(&event(true));
        board.apply(&event(false));
        assert_eq!(board.accuracy(), 67);
    }

    #[test]
    fn test_summary_requires_judged_blocks() {
        let mut board = ScoreBoard::new();
        assert!(board.summary(PracticeMode::Test).is_none());
        assert_eq!(board.accuracy(), 0);

        board.apply(&event(false));
        let summary = board.summary(PracticeMode::Test).unwrap();
        assert_eq!(summary.targets_played, 1);
        assert_eq!(summary.accuracy, 0);

        board.reset();
        assert_eq!(board, ScoreBoard::default());
    }
}
