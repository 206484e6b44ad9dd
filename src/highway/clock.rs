//! GameClock - elapsed run time with freeze/resume
//!
//! Game time is wall time minus a start timestamp. Freezing captures the
//! current game time; resuming re-bases the start timestamp so that game
//! time continues from exactly the frozen value, with no jump and no debt.

/// Monotonic run clock driven by caller-supplied wall timestamps (ms)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GameClock {
    start_ms: f64,
    frozen: Option<f64>,
}

impl GameClock {
    /// Start counting from zero at `now_ms`
    pub fn started_at(now_ms: f64) -> Self {
        Self {
            start_ms: now_ms,
            frozen: None,
        }
    }

    /// Elapsed game time at `now_ms` (the frozen value while frozen)
    pub fn elapsed(&self, now_ms: f64) -> f64 {
        match self.frozen {
            Some(frozen) => frozen,
            None => now_ms - self.start_ms,
        }
    }

    /// Stop game time at `game_time_ms`
    pub fn freeze(&mut self, game_time_ms: f64) {
        self.frozen = Some(game_time_ms);
    }

    /// Continue from the frozen value; no-op when not frozen
    ///
    /// # Returns
    /// The game time at which the clock resumed, if it was frozen.
    pub fn resume(&mut self, now_ms: f64) -> Option<f64> {
        let frozen = self.frozen.take()?;
        self.start_ms = now_ms - frozen;
        Some(frozen)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn start_ms(&self) -> f64 {
        self.start_ms
    }
}
