//! HighwayScheduler - run state machine and per-tick judgement
//!
//! Key features:
//! - Expands a target sequence into timed blocks on `start`
//! - Judges each unresolved block against the live detection every tick
//! - Test mode marks passed blocks missed; practice mode freezes the clock
//!   on the first passed block until the learner plays it
//! - A minimum wall-clock gap between hits stops one sustained sound from
//!   scoring several blocks
//!
//! States:
//! ```text
//! Stopped --start--> Running --block passes (practice)--> PausedForRetry
//!                       ^                                      |
//!                       +------------- pending block hit ------+
//! any --stop/reset--> Stopped
//! ```
//!
//! # Thread Safety
//! The scheduler is plain owned state. It is driven from a single render
//! tick; the detection side only ever hands it a snapshot of the live
//! match, so no locking happens here.

use serde::{Deserialize, Serialize};

use super::block::{self, BlockStatus, SequenceKind, TargetSequence, TimedBlock};
use super::clock::GameClock;
use super::judge::{target_matches, HitWindow, LiveMatch};
use super::score::ScoreEvent;
use super::{PracticeMode, RunState};
use crate::config::HighwayConfig;
use crate::error::SessionError;

/// Result of one `advance` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Snapshot of every block after this tick
    pub blocks: Vec<TimedBlock>,
    /// Judgements made during this tick, in block order
    pub events: Vec<ScoreEvent>,
    pub state: RunState,
    pub game_time_ms: f64,
}

/// Timed event scheduler for one practice or test run at a time
#[derive(Debug, Clone)]
pub struct HighwayScheduler {
    config: HighwayConfig,
    mode: PracticeMode,
    state: RunState,
    clock: GameClock,
    blocks: Vec<TimedBlock>,
    kind: Option<SequenceKind>,
    window: HitWindow,
    pending_retry: Option<usize>,
    last_hit_wall_ms: Option<f64>,
}

impl Default for HighwayScheduler {
    fn default() -> Self {
        Self::new(HighwayConfig::default())
    }
}

impl HighwayScheduler {
    pub fn new(config: HighwayConfig) -> Self {
        let window = HitWindow::symmetric(config.chord_hit_window_ms);
        Self {
            config,
            mode: PracticeMode::default(),
            state: RunState::Stopped,
            clock: GameClock::default(),
            blocks: Vec::new(),
            kind: None,
            window,
            pending_retry: None,
            last_hit_wall_ms: None,
        }
    }

    pub fn config(&self) -> &HighwayConfig {
        &self.config
    }

    pub fn mode(&self) -> PracticeMode {
        self.mode
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn blocks(&self) -> &[TimedBlock] {
        &self.blocks
    }

    /// Kind of the running sequence, `None` when stopped
    pub fn kind(&self) -> Option<SequenceKind> {
        self.kind
    }

    pub fn hit_window(&self) -> HitWindow {
        self.window
    }

    pub fn pending_retry(&self) -> Option<&TimedBlock> {
        self.pending_retry.and_then(|i| self.blocks.get(i))
    }

    pub fn game_time(&self, now_ms: f64) -> f64 {
        match self.state {
            RunState::Stopped => 0.0,
            _ => self.clock.elapsed(now_ms),
        }
    }

    /// Game time at which the last block ends
    pub fn run_duration_ms(&self) -> f64 {
        block::run_duration_ms(&self.blocks, self.config.travel_duration_ms)
    }

    /// True once every block has been hit or missed
    pub fn is_complete(&self) -> bool {
        self.state != RunState::Stopped
            && self
                .blocks
                .iter()
                .all(|b| matches!(b.status, BlockStatus::Hit | BlockStatus::Missed))
    }

    /// Choose the policy for the next run
    ///
    /// # Errors
    /// `ModeLocked` unless stopped.
    pub fn set_mode(&mut self, mode: PracticeMode) -> Result<(), SessionError> {
        if self.state != RunState::Stopped {
            return Err(SessionError::ModeLocked);
        }
        self.mode = mode;
        Ok(())
    }

    /// Begin a run at wall time `now_ms`
    ///
    /// All state from any previous run (blocks, pause, frozen time, retry
    /// pointer, hit gap) is discarded before the first tick. On error the
    /// scheduler is left untouched.
    ///
    /// # Returns
    /// Number of scheduled blocks (zero for an empty sequence, in which
    /// case the run stays running with nothing to judge).
    pub fn start(
        &mut self,
        sequence: &TargetSequence,
        bpm: f64,
        loops: u32,
        mode: PracticeMode,
        now_ms: f64,
    ) -> Result<usize, SessionError> {
        let blocks = block::expand(sequence, bpm, loops, &self.config)?;
        let kind = sequence.kind();

        self.clear_run();
        self.mode = mode;
        self.kind = Some(kind);
        self.window = HitWindow::for_kind(kind, &self.config);
        self.blocks = blocks;
        self.clock = GameClock::started_at(now_ms);
        self.state = RunState::Running;

        tracing::info!(
            "[Highway] Run started: {} blocks, {:?} mode, {} BPM x {} loops",
            self.blocks.len(),
            mode,
            bpm,
            loops
        );
        Ok(self.blocks.len())
    }

    /// End the run and discard its blocks. Mode is kept for the next run.
    pub fn stop(&mut self) {
        if self.state != RunState::Stopped {
            tracing::info!("[Highway] Run stopped");
        }
        self.clear_run();
    }

    /// Stop and return to the freshly constructed state (practice mode)
    pub fn reset(&mut self) {
        self.clear_run();
        self.mode = PracticeMode::default();
    }

    fn clear_run(&mut self) {
        self.state = RunState::Stopped;
        self.blocks.clear();
        self.kind = None;
        self.clock = GameClock::default();
        self.pending_retry = None;
        self.last_hit_wall_ms = None;
    }

    /// Advance the run to wall time `now_ms` against the latest detection
    pub fn advance(&mut self, now_ms: f64, live: Option<&LiveMatch>) -> Tick {
        let mut events = Vec::new();

        match self.state {
            RunState::Stopped => {}
            RunState::PausedForRetry => self.poll_retry(now_ms, live, &mut events),
            RunState::Running => self.judge_blocks(now_ms, live, &mut events),
        }

        Tick {
            blocks: self.blocks.clone(),
            events,
            state: self.state,
            game_time_ms: self.game_time(now_ms),
        }
    }

    fn gap_elapsed(&self, now_ms: f64) -> bool {
        self.last_hit_wall_ms
            .map_or(true, |last| now_ms - last > self.config.min_hit_gap_ms)
    }

    fn poll_retry(&mut self, now_ms: f64, live: Option<&LiveMatch>, events: &mut Vec<ScoreEvent>) {
        let (Some(index), Some(live)) = (self.pending_retry, live) else {
            return;
        };
        if !target_matches(&self.blocks[index].target, live) || !self.gap_elapsed(now_ms) {
            return;
        }

        let resumed_at = self.clock.resume(now_ms).unwrap_or_else(|| self.clock.elapsed(now_ms));
        self.last_hit_wall_ms = Some(now_ms);
        self.pending_retry = None;
        self.state = RunState::Running;

        let block = &mut self.blocks[index];
        block.status = BlockStatus::Hit;
        events.push(ScoreEvent {
            hit: true,
            target: block.target.clone(),
            block_id: block.id,
            game_time_ms: resumed_at,
            score_delta: self.config.hit_score,
        });
        tracing::info!(
            "[Highway] Retry hit on block {} ({}), resuming at {:.0} ms",
            block.id,
            block.target,
            resumed_at
        );
    }

    fn judge_blocks(&mut self, now_ms: f64, live: Option<&LiveMatch>, events: &mut Vec<ScoreEvent>) {
        let game_time = self.clock.elapsed(now_ms);
        let mut hit_this_tick = false;

        for index in 0..self.blocks.len() {
            if !self.blocks[index].is_unresolved() {
                continue;
            }
            let time_to_hit = self.blocks[index].time_to_hit(game_time);

            let matched = live.map_or(false, |m| target_matches(&self.blocks[index].target, m));
            if !hit_this_tick
                && matched
                && self.window.contains(time_to_hit)
                && self.gap_elapsed(now_ms)
            {
                hit_this_tick = true;
                self.last_hit_wall_ms = Some(now_ms);
                let block = &mut self.blocks[index];
                block.status = BlockStatus::Hit;
                events.push(ScoreEvent {
                    hit: true,
                    target: block.target.clone(),
                    block_id: block.id,
                    game_time_ms: game_time,
                    score_delta: self.config.hit_score,
                });
                tracing::debug!("[Highway] Hit block {} ({})", block.id, block.target);
                continue;
            }

            if !self.window.has_passed(time_to_hit) {
                continue;
            }

            let block = &mut self.blocks[index];
            match self.mode {
                PracticeMode::Test => {
                    block.status = BlockStatus::Missed;
                    events.push(ScoreEvent {
                        hit: false,
                        target: block.target.clone(),
                        block_id: block.id,
                        game_time_ms: game_time,
                        score_delta: 0,
                    });
                    tracing::debug!("[Highway] Missed block {} ({})", block.id, block.target);
                }
                PracticeMode::Practice => {
                    block.status = BlockStatus::PendingRetry;
                    self.pending_retry = Some(index);
                    self.clock.freeze(game_time);
                    self.state = RunState::PausedForRetry;
                    tracing::info!(
                        "[Highway] Paused at {:.0} ms waiting for block {} ({})",
                        game_time,
                        block.id,
                        block.target
                    );
                    // Later blocks wait until this one is played
                    break;
                }
            }
        }
    }

    /// Preview list: pending block first, then unresolved blocks still in
    /// or before their window, by arrival
    pub fn upcoming(&self, now_ms: f64, limit: usize) -> Vec<&TimedBlock> {
        let game_time = self.game_time(now_ms);
        let mut preview: Vec<&TimedBlock> = self.pending_retry().into_iter().collect();

        let mut next: Vec<&TimedBlock> = self
            .blocks
            .iter()
            .filter(|b| b.is_unresolved() && !self.window.has_passed(b.time_to_hit(game_time)))
            .collect();
        next.sort_by(|a, b| a.arrival_ms.total_cmp(&b.arrival_ms));

        preview.extend(next);
        preview.truncate(limit);
        preview
    }

    /// Position of a block on its approach: 1.0 when it appears, 0.0 at the
    /// hit line, negative once past
    pub fn approach_fraction(&self, block: &TimedBlock, now_ms: f64) -> f64 {
        block.time_to_hit(self.game_time(now_ms)) / self.config.travel_duration_ms
    }
}
