// Detection pipelines - PCM chunks in, live match out
//
// Each pipeline owns its frame assembler so callers can feed whatever chunk
// size the device or file reader produces. Frame timestamps come from the
// sample clock (end of the analysed window), which keeps offline analysis
// deterministic.

use serde::Serialize;

use super::features::{ChromaExtractor, FrameAssembler, PitchFrame, PitchFrameExtractor};
use super::{ChordMatch, ChordMatcher, ChromaVector, ChromagramSmoother, NoteMatch, NoteResolver};
use crate::calibration::{CalibrationProgress, CalibrationStep, NoiseFloorCalibrator};
use crate::config::{ChordDetectionConfig, NoteDetectionConfig};
use crate::error::CalibrationError;

/// What happened to one chroma frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChordFrameOutcome {
    /// Consumed by the calibrator; no matching while calibrating
    Calibrating { collected: usize, needed: usize },
    /// This frame completed calibration
    Calibrated,
    /// Smoothed and matched
    Matched { result: Option<ChordMatch> },
}

/// One processed chroma window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChordFrame {
    pub time_ms: f64,
    pub outcome: ChordFrameOutcome,
}

/// Chroma -> calibrator -> smoother -> matcher
pub struct ChordPipeline {
    extractor: ChromaExtractor,
    assembler: FrameAssembler,
    calibrator: NoiseFloorCalibrator,
    smoother: ChromagramSmoother,
    matcher: ChordMatcher,
    current: Option<ChordMatch>,
    frames_emitted: u64,
}

impl ChordPipeline {
    /// # Errors
    /// `InvalidWindow` when the configured calibration window is empty.
    pub fn new(sample_rate: u32, config: &ChordDetectionConfig) -> Result<Self, CalibrationError> {
        let extractor = ChromaExtractor::from_config(sample_rate, config);
        let window = extractor.window_size();
        Ok(Self {
            extractor,
            assembler: FrameAssembler::new(window, window),
            calibrator: NoiseFloorCalibrator::from_config(config)?,
            smoother: ChromagramSmoother::new(config.rolling_window),
            matcher: ChordMatcher::from_config(config),
            current: None,
            frames_emitted: 0,
        })
    }

    /// A new input stream became available: recalibrate against it
    pub fn on_stream_connected(&mut self) {
        tracing::info!("[ChordPipeline] Stream connected, auto-calibrating");
        self.assembler.reset();
        self.frames_emitted = 0;
        self.start_calibration();
    }

    /// Discard the current floor and smoothing history and listen to the room
    pub fn start_calibration(&mut self) {
        self.calibrator.start_calibration();
        self.smoother.reset();
        self.current = None;
    }

    /// Stream lost: forget everything
    pub fn reset(&mut self) {
        self.calibrator.reset();
        self.smoother.reset();
        self.assembler.reset();
        self.current = None;
        self.frames_emitted = 0;
    }

    pub fn current_match(&self) -> Option<&ChordMatch> {
        self.current.as_ref()
    }

    pub fn calibration_progress(&self) -> CalibrationProgress {
        self.calibrator.progress()
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrator.is_calibrating()
    }

    pub fn window_size(&self) -> usize {
        self.extractor.window_size()
    }

    /// Process one chroma frame
    pub fn process_chroma(&mut self, frame: &ChromaVector) -> ChordFrameOutcome {
        match self.calibrator.ingest(frame) {
            Ok(CalibrationStep::Collecting { collected, needed }) => {
                return ChordFrameOutcome::Calibrating { collected, needed };
            }
            Ok(CalibrationStep::Completed(_)) => return ChordFrameOutcome::Calibrated,
            // Not calibrating: the frame goes to the matcher
            Err(_) => {}
        }

        let denoised = self.calibrator.denoise(frame);
        let smoothed = self.smoother.push(denoised);
        self.current = self.matcher.match_chord(&smoothed);
        tracing::trace!("[ChordPipeline] match {:?}", self.current);

        ChordFrameOutcome::Matched {
            result: self.current.clone(),
        }
    }

    /// Feed raw mono samples; returns one entry per completed window
    pub fn push_samples(&mut self, samples: &[f32]) -> Vec<ChordFrame> {
        let windows = self.assembler.push(samples);
        let mut frames = Vec::with_capacity(windows.len());
        for window in windows {
            let time_ms = self.window_end_ms();
            let chroma = self.extractor.extract(&window);
            let outcome = self.process_chroma(&chroma);
            frames.push(ChordFrame { time_ms, outcome });
        }
        frames
    }

    fn window_end_ms(&mut self) -> f64 {
        let hop = self.assembler.hop_size() as u64;
        let end = self.frames_emitted * hop + self.assembler.window_size() as u64;
        self.frames_emitted += 1;
        end as f64 * 1000.0 / f64::from(self.extractor.sample_rate())
    }
}

/// One processed pitch window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteFrame {
    pub time_ms: f64,
    pub frame: PitchFrame,
    pub note: Option<NoteMatch>,
}

/// Pitch + RMS -> note resolver
pub struct NotePipeline {
    extractor: PitchFrameExtractor,
    assembler: FrameAssembler,
    resolver: NoteResolver,
    sample_rate: u32,
    current: Option<NoteMatch>,
    frames_emitted: u64,
}

impl NotePipeline {
    pub fn new(sample_rate: u32, config: &NoteDetectionConfig) -> Self {
        Self {
            extractor: PitchFrameExtractor::new(config.buffer_size, sample_rate),
            assembler: FrameAssembler::new(config.buffer_size, config.hop_size),
            resolver: NoteResolver::new(config.clone()),
            sample_rate,
            current: None,
            frames_emitted: 0,
        }
    }

    pub fn current_match(&self) -> Option<&NoteMatch> {
        self.current.as_ref()
    }

    pub fn reset(&mut self) {
        self.assembler.reset();
        self.resolver.reset();
        self.current = None;
        self.frames_emitted = 0;
    }

    /// Resolve one externally produced pitch frame
    pub fn process_pitch(&mut self, frame: &PitchFrame, now_ms: f64) -> Option<NoteMatch> {
        self.current = self.resolver.resolve(frame, now_ms);
        self.current.clone()
    }

    /// Feed raw mono samples; returns one entry per completed window
    pub fn push_samples(&mut self, samples: &[f32]) -> Vec<NoteFrame> {
        let windows = self.assembler.push(samples);
        let mut frames = Vec::with_capacity(windows.len());
        for window in windows {
            let hop = self.assembler.hop_size() as u64;
            let end = self.frames_emitted * hop + self.assembler.window_size() as u64;
            self.frames_emitted += 1;
            let time_ms = end as f64 * 1000.0 / f64::from(self.sample_rate);

            let frame = self.extractor.extract(&window);
            let note = self.process_pitch(&frame, time_ms);
            frames.push(NoteFrame {
                time_ms,
                frame,
                note,
            });
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::{chords, GuitarString};

    fn sine(freq: f32, sample_rate: u32, len: usize, amp: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_calibrating_frames_are_not_matched() {
        let config = ChordDetectionConfig {
            calibration_frames: 3,
            ..Default::default()
        };
        let mut pipeline = ChordPipeline::new(44_100, &config).unwrap();
        pipeline.start_calibration();

        let em = chords::chord("Em").unwrap().chroma;
        assert_eq!(
            pipeline.process_chroma(&em),
            ChordFrameOutcome::Calibrating {
                collected: 1,
                needed: 3
            }
        );
        pipeline.process_chroma(&em);
        assert_eq!(pipeline.process_chroma(&em), ChordFrameOutcome::Calibrated);
        assert!(pipeline.current_match().is_none());

        // The room sounded like Em, so Em itself now denoises to silence
        assert_eq!(
            pipeline.process_chroma(&em),
            ChordFrameOutcome::Matched { result: None }
        );
    }

    #[test]
    fn test_uncalibrated_frames_match_directly() {
        let mut pipeline = ChordPipeline::new(44_100, &ChordDetectionConfig::default()).unwrap();
        let mut frame = [0.0; 12];
        frame[4] = 1.0;
        frame[7] = 1.0;
        frame[11] = 1.0;

        let mut last = None;
        for _ in 0..15 {
            if let ChordFrameOutcome::Matched { result } = pipeline.process_chroma(&frame) {
                last = result;
            }
        }
        let found = last.unwrap();
        assert_eq!(found.chord, "Em");
        assert!((found.confidence - 1.0).abs() < 1e-6);
        assert_eq!(pipeline.current_match(), Some(&found));
    }

    #[test]
    fn test_recalibration_clears_current_match() {
        let mut pipeline = ChordPipeline::new(44_100, &ChordDetectionConfig::default()).unwrap();
        pipeline.process_chroma(&chords::chord("G").unwrap().chroma);
        assert!(pipeline.current_match().is_some());

        pipeline.on_stream_connected();
        assert!(pipeline.is_calibrating());
        assert!(pipeline.current_match().is_none());
    }

    #[test]
    fn test_chord_frame_timestamps_follow_sample_clock() {
        let config = ChordDetectionConfig::default();
        let mut pipeline = ChordPipeline::new(44_100, &config).unwrap();
        let frames = pipeline.push_samples(&vec![0.0; 4096 * 2 + 10]);
        assert_eq!(frames.len(), 2);
        assert!((frames[0].time_ms - 4096.0 * 1000.0 / 44_100.0).abs() < 1e-9);
        assert!((frames[1].time_ms - 8192.0 * 1000.0 / 44_100.0).abs() < 1e-9);
    }

    #[test]
    fn test_note_pipeline_resolves_open_a() {
        let mut pipeline = NotePipeline::new(44_100, &NoteDetectionConfig::default());
        let frames = pipeline.push_samples(&sine(110.0, 44_100, 8192, 0.3));

        // (8192 - 4096) / 1024 + 1 windows
        assert_eq!(frames.len(), 5);
        let note = frames.last().and_then(|f| f.note.clone()).unwrap();
        assert_eq!(note.midi, 45);
        assert_eq!(note.string, GuitarString::A);
        assert_eq!(note.fret, 0);
        assert_eq!(pipeline.current_match(), Some(&note));
    }

    #[test]
    fn test_note_pipeline_silence() {
        let mut pipeline = NotePipeline::new(44_100, &NoteDetectionConfig::default());
        let frames = pipeline.push_samples(&vec![0.0; 4096]);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].note.is_none());
        assert!(pipeline.current_match().is_none());
    }
}
