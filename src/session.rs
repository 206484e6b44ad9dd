// PracticeSession - detection pipeline + scheduler + score board
//
// Two cooperative callbacks drive a session:
// - detection (`on_samples`, `on_chroma_frame`, `on_pitch_frame`): the only
//   writers of the live match
// - render tick (`on_tick`): reads a snapshot of the live match, advances
//   the scheduler and applies score events
//
// Both take `&mut self`, so each callback sees a consistent state and
// publishes its result before the other runs.

use crate::analysis::features::PitchFrame;
use crate::analysis::{ChordFrameOutcome, ChordPipeline, ChromaVector, NotePipeline};
use crate::calibration::CalibrationProgress;
use crate::config::AppConfig;
use crate::error::{CalibrationError, SessionError};
use crate::highway::{
    HighwayScheduler, LiveMatch, PracticeMode, RunState, ScoreBoard, SequenceKind, SessionSummary,
    TargetSequence, Tick,
};
use crate::telemetry::{self, DetectorKind, TelemetryHub};

/// The recogniser feeding a session
pub enum Detector {
    Chord(ChordPipeline),
    Note(NotePipeline),
}

impl Detector {
    pub fn kind(&self) -> SequenceKind {
        match self {
            Detector::Chord(_) => SequenceKind::Chords,
            Detector::Note(_) => SequenceKind::Notes,
        }
    }
}

pub struct PracticeSession {
    detector: Detector,
    live: Option<LiveMatch>,
    scheduler: HighwayScheduler,
    score: ScoreBoard,
    telemetry: &'static TelemetryHub,
}

impl PracticeSession {
    /// Session listening for chords
    ///
    /// # Errors
    /// `InvalidWindow` when the configured calibration window is empty.
    pub fn for_chords(config: &AppConfig, sample_rate: u32) -> Result<Self, CalibrationError> {
        let pipeline = ChordPipeline::new(sample_rate, &config.chord_detection)?;
        Ok(Self::with_detector(Detector::Chord(pipeline), config))
    }

    /// Session listening for single notes
    pub fn for_notes(config: &AppConfig, sample_rate: u32) -> Self {
        let pipeline = NotePipeline::new(sample_rate, &config.note_detection);
        Self::with_detector(Detector::Note(pipeline), config)
    }

    pub fn with_detector(detector: Detector, config: &AppConfig) -> Self {
        Self {
            detector,
            live: None,
            scheduler: HighwayScheduler::new(config.highway.clone()),
            score: ScoreBoard::new(),
            telemetry: telemetry::hub(),
        }
    }

    /// Publish to a specific hub instead of the global one
    pub fn with_telemetry(mut self, hub: &'static TelemetryHub) -> Self {
        self.telemetry = hub;
        self
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn live_match(&self) -> Option<&LiveMatch> {
        self.live.as_ref()
    }

    pub fn scheduler(&self) -> &HighwayScheduler {
        &self.scheduler
    }

    pub fn score(&self) -> &ScoreBoard {
        &self.score
    }

    pub fn state(&self) -> RunState {
        self.scheduler.state()
    }

    /// Chord calibration progress; `None` for note sessions
    pub fn calibration_progress(&self) -> Option<CalibrationProgress> {
        match &self.detector {
            Detector::Chord(pipeline) => Some(pipeline.calibration_progress()),
            Detector::Note(_) => None,
        }
    }

    /// A microphone stream became available
    pub fn on_stream_connected(&mut self) {
        self.live = None;
        match &mut self.detector {
            Detector::Chord(pipeline) => pipeline.on_stream_connected(),
            Detector::Note(pipeline) => pipeline.reset(),
        }
        self.publish_calibration();
    }

    /// The stream went away: degrade to "no match"
    pub fn on_stream_lost(&mut self) {
        tracing::warn!("[Session] Input stream lost");
        self.live = None;
        match &mut self.detector {
            Detector::Chord(pipeline) => pipeline.reset(),
            Detector::Note(pipeline) => pipeline.reset(),
        }
    }

    /// Manually recalibrate the chord detector
    pub fn start_calibration(&mut self) {
        if let Detector::Chord(pipeline) = &mut self.detector {
            pipeline.start_calibration();
            self.live = None;
            self.publish_calibration();
        }
    }

    /// Detection callback for raw mono samples
    pub fn on_samples(&mut self, samples: &[f32]) {
        match &mut self.detector {
            Detector::Chord(pipeline) => {
                let frames = pipeline.push_samples(samples);
                let calibration_changed = frames.iter().any(|f| {
                    !matches!(f.outcome, ChordFrameOutcome::Matched { .. })
                });
                if !frames.is_empty() {
                    self.live = pipeline.current_match().cloned().map(LiveMatch::Chord);
                }
                if calibration_changed {
                    self.publish_calibration();
                }
            }
            Detector::Note(pipeline) => {
                if !pipeline.push_samples(samples).is_empty() {
                    self.live = pipeline.current_match().cloned().map(LiveMatch::Note);
                }
            }
        }
        self.publish_detection();
    }

    /// Detection callback for an externally computed chroma frame
    pub fn on_chroma_frame(&mut self, frame: &ChromaVector) {
        let Detector::Chord(pipeline) = &mut self.detector else {
            tracing::debug!("[Session] Chroma frame ignored by note session");
            return;
        };
        let outcome = pipeline.process_chroma(frame);
        self.live = pipeline.current_match().cloned().map(LiveMatch::Chord);
        if !matches!(outcome, ChordFrameOutcome::Matched { .. }) {
            self.publish_calibration();
        }
        self.publish_detection();
    }

    /// Detection callback for an externally computed pitch frame
    pub fn on_pitch_frame(&mut self, frame: &PitchFrame, now_ms: f64) {
        let Detector::Note(pipeline) = &mut self.detector else {
            tracing::debug!("[Session] Pitch frame ignored by chord session");
            return;
        };
        self.live = pipeline.process_pitch(frame, now_ms).map(LiveMatch::Note);
        self.publish_detection();
    }

    /// Render tick: judge blocks against the current live match
    pub fn on_tick(&mut self, now_ms: f64) -> Tick {
        let before = self.scheduler.state();
        let snapshot = self.live.clone();
        let tick = self.scheduler.advance(now_ms, snapshot.as_ref());

        for event in &tick.events {
            self.score.apply(event);
            self.telemetry.record_score(event);
        }
        if tick.state != before {
            self.telemetry.record_run_state(tick.state, tick.game_time_ms);
        }
        tick
    }

    /// Begin a run; the score board starts from zero
    ///
    /// # Errors
    /// Any validation error from the scheduler; the previous run is kept.
    pub fn start(
        &mut self,
        sequence: &TargetSequence,
        bpm: f64,
        loops: u32,
        mode: PracticeMode,
        now_ms: f64,
    ) -> Result<usize, SessionError> {
        if !sequence.is_empty() && sequence.kind() != self.detector.kind() {
            tracing::warn!(
                "[Session] {:?} sequence started on a {:?} detector; nothing will match",
                sequence.kind(),
                self.detector.kind()
            );
        }

        let count = self.scheduler.start(sequence, bpm, loops, mode, now_ms)?;
        self.score.reset();
        self.telemetry.record_run_state(RunState::Running, 0.0);
        tracing::info!("[Session] Started {:?} run with {} targets", mode, count);
        Ok(count)
    }

    /// Stop the run
    ///
    /// # Returns
    /// A summary if a run was active and at least one block was judged.
    /// Stopping an already stopped session returns `None`.
    pub fn stop(&mut self, now_ms: f64) -> Option<SessionSummary> {
        if self.scheduler.state() == RunState::Stopped {
            return None;
        }

        let game_time = self.scheduler.game_time(now_ms);
        let summary = self.score.summary(self.scheduler.mode());
        self.scheduler.stop();
        self.telemetry.record_run_state(RunState::Stopped, game_time);
        if let Some(summary) = &summary {
            self.telemetry.record_summary(summary);
            tracing::info!(
                "[Session] Summary: {} / {} hit, score {}, accuracy {}%",
                summary.hits,
                summary.targets_played,
                summary.score,
                summary.accuracy
            );
        }
        summary
    }

    /// Stop without a summary and clear score and live match
    pub fn reset(&mut self) {
        self.scheduler.reset();
        self.score.reset();
        self.live = None;
    }

    /// # Errors
    /// `ModeLocked` while a run is active.
    pub fn set_mode(&mut self, mode: PracticeMode) -> Result<(), SessionError> {
        self.scheduler.set_mode(mode).map_err(|err| {
            self.telemetry.record_error(&err, "set_mode");
            err
        })
    }

    fn publish_calibration(&self) {
        if let Some(progress) = self.calibration_progress() {
            self.telemetry.record_calibration(&progress);
        }
    }

    fn publish_detection(&self) {
        let detector = match self.detector {
            Detector::Chord(_) => DetectorKind::Chord,
            Detector::Note(_) => DetectorKind::Note,
        };
        let (label, confidence) = match &self.live {
            Some(LiveMatch::Chord(m)) => (Some(m.chord.clone()), m.confidence),
            Some(LiveMatch::Note(m)) => (self.live.as_ref().map(LiveMatch::label), m.clarity),
            None => (None, 0.0),
        };
        self.telemetry.record_detection(detector, label, confidence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highway::{BlockStatus, ChordStep};
    use crate::telemetry::MetricEvent;

    fn em_frame() -> ChromaVector {
        let mut frame = [0.0; 12];
        frame[4] = 1.0;
        frame[7] = 1.0;
        frame[11] = 1.0;
        frame
    }

    #[test]
    fn test_chord_frames_drive_hits() {
        let mut session = PracticeSession::for_chords(&AppConfig::default(), 44_100).unwrap();
        let sequence = TargetSequence::Progression(vec![ChordStep::new("Em", 4.0)]);
        session
            .start(&sequence, 60.0, 1, PracticeMode::Test, 0.0)
            .unwrap();

        session.on_chroma_frame(&em_frame());
        assert!(matches!(session.live_match(), Some(LiveMatch::Chord(m)) if m.chord == "Em"));

        let tick = session.on_tick(4_000.0);
        assert_eq!(tick.events.len(), 1);
        assert_eq!(tick.blocks[0].status, BlockStatus::Hit);
        assert_eq!(session.score().score, 10);

        let summary = session.stop(8_000.0).unwrap();
        assert_eq!(summary.hits, 1);
        assert_eq!(summary.accuracy, 100);
        assert_eq!(session.state(), RunState::Stopped);
    }

    #[test]
    fn test_calibration_suppresses_live_match() {
        let mut session = PracticeSession::for_chords(&AppConfig::default(), 44_100).unwrap();
        session.on_chroma_frame(&em_frame());
        assert!(session.live_match().is_some());

        session.on_stream_connected();
        assert!(session.live_match().is_none());
        session.on_chroma_frame(&em_frame());
        assert!(session.live_match().is_none());
        assert_eq!(
            session.calibration_progress().map(|p| p.frames_collected),
            Some(1)
        );
    }

    #[test]
    fn test_pitch_frames_drive_note_match() {
        let mut session = PracticeSession::for_notes(&AppConfig::default(), 44_100);
        session.on_pitch_frame(&PitchFrame::new(110.0, 0.99, 0.1), 0.0);
        assert!(matches!(session.live_match(), Some(LiveMatch::Note(m)) if m.midi == 45));

        // Chroma frames do not touch a note session
        session.on_chroma_frame(&em_frame());
        assert!(matches!(session.live_match(), Some(LiveMatch::Note(_))));

        session.on_stream_lost();
        assert!(session.live_match().is_none());
    }

    #[test]
    fn test_second_stop_reports_nothing() {
        let hub: &'static TelemetryHub = Box::leak(Box::new(TelemetryHub::new(16, 64)));
        let mut session = PracticeSession::for_chords(&AppConfig::default(), 44_100)
            .unwrap()
            .with_telemetry(hub);
        let sequence = TargetSequence::Progression(vec![ChordStep::new("Em", 4.0)]);
        session
            .start(&sequence, 60.0, 1, PracticeMode::Test, 0.0)
            .unwrap();

        // Nothing played: the only block is missed
        session.on_tick(100_000.0);
        let first = session.stop(100_000.0).unwrap();
        assert_eq!(first.misses, 1);

        assert!(session.stop(100_500.0).is_none());
        assert_eq!(session.state(), RunState::Stopped);

        let summaries = hub
            .snapshot()
            .recent
            .iter()
            .filter(|e| matches!(e, MetricEvent::Summary(_)))
            .count();
        assert_eq!(summaries, 1);
    }

    #[test]
    fn test_stop_without_judgements_has_no_summary() {
        let mut session = PracticeSession::for_notes(&AppConfig::default(), 44_100);
        let sequence = TargetSequence::Progression(Vec::new());
        session
            .start(&sequence, 80.0, 1, PracticeMode::Practice, 0.0)
            .unwrap();
        assert!(session.stop(1_000.0).is_none());
    }

    #[test]
    fn test_mode_switch_locked_during_run() {
        let mut session = PracticeSession::for_notes(&AppConfig::default(), 44_100);
        let sequence = TargetSequence::Progression(vec![ChordStep::new("C", 4.0)]);
        session
            .start(&sequence, 80.0, 1, PracticeMode::Practice, 0.0)
            .unwrap();
        assert_eq!(
            session.set_mode(PracticeMode::Test),
            Err(SessionError::ModeLocked)
        );
        session.reset();
        assert!(session.set_mode(PracticeMode::Test).is_ok());
    }
}
