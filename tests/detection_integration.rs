//! Integration tests for the recognition side
//!
//! These tests drive the public detection API end to end:
//! - Chord matching, smoothing and noise-floor calibration on chroma frames
//! - The chord pipeline on synthetic PCM, with and without calibration
//! - The note pipeline and tuner on synthetic sines
//! - The flashcard hold judge on a stream of chord matches

use fret_trainer::analysis::features::PitchFrameExtractor;
use fret_trainer::analysis::{
    match_chord, ChordFrameOutcome, ChordMatch, ChordPipeline, ChromagramSmoother,
    FlashcardJudge, FlashcardStatus, NotePipeline, Tuner, TuningStatus,
};
use fret_trainer::calibration::{CalibrationStep, NoiseFloorCalibrator};
use fret_trainer::config::AppConfig;
use fret_trainer::fixtures::{sine, white_noise, FixtureSource, NOISE_SEED};
use fret_trainer::theory::{chord, GuitarString};

const SAMPLE_RATE: u32 = 44_100;

fn em_frame() -> [f32; 12] {
    [0., 0., 0., 0., 1., 0., 0., 1., 0., 0., 0., 1.]
}

/// E4 + G4 + B4, high enough that each partial stays inside its pitch class
fn em_triad(frames: usize) -> Vec<f32> {
    let mut samples = vec![0.0_f32; frames];
    for hz in [329.63_f32, 392.00, 493.88] {
        for (s, t) in samples.iter_mut().zip(sine(hz, 0.2, SAMPLE_RATE, frames)) {
            *s += t;
        }
    }
    samples
}

fn last_chord_match(pipeline: &mut ChordPipeline, samples: &[f32]) -> Option<ChordMatch> {
    let mut last = None;
    for chunk in samples.chunks(1024) {
        for frame in pipeline.push_samples(chunk) {
            if let ChordFrameOutcome::Matched { result } = frame.outcome {
                last = result;
            }
        }
    }
    last
}

#[test]
fn test_every_template_matches_itself() {
    for name in ["Em", "Am", "D", "G", "C"] {
        let template = chord(name).unwrap();
        let result = match_chord(&template.chroma).unwrap();
        assert_eq!(result.chord, name);
        assert!((result.confidence - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_zero_vector_is_no_match() {
    assert!(match_chord(&[0.0; 12]).is_none());
}

#[test]
fn test_fifteen_em_frames_through_smoother_match_em() {
    let mut smoother = ChromagramSmoother::new(15);
    let mut smoothed = [0.0; 12];
    for _ in 0..15 {
        smoothed = smoother.push(em_frame());
    }

    let result = match_chord(&smoothed).unwrap();
    assert_eq!(result.chord, "Em");
    assert!((result.confidence - 1.0).abs() < 1e-5);
}

#[test]
fn test_calibrating_on_constant_vector_denoises_it_to_zero() {
    let floor = [0.25, 0.125, 0.0, 0.5, 0.5, 0.125, 0.0, 0.75, 0.25, 0.125, 0.0, 1.0];
    let mut calibrator = NoiseFloorCalibrator::new(25).unwrap();
    calibrator.start_calibration();

    let mut completed = false;
    for _ in 0..25 {
        if let CalibrationStep::Completed(captured) = calibrator.ingest(&floor).unwrap() {
            assert_eq!(captured, floor);
            completed = true;
        }
    }

    assert!(completed);
    assert!(calibrator.is_calibrated());
    assert_eq!(calibrator.denoise(&floor), [0.0; 12]);
}

#[test]
fn test_chord_pipeline_recognises_em_triad() {
    let config = AppConfig::default();
    let mut pipeline = ChordPipeline::new(SAMPLE_RATE, &config.chord_detection).unwrap();

    let result = last_chord_match(&mut pipeline, &em_triad(SAMPLE_RATE as usize)).unwrap();
    assert_eq!(result.chord, "Em");
    assert!(result.confidence > 0.9);
}

#[test]
fn test_chord_pipeline_calibrates_on_connect_then_matches() {
    let config = AppConfig::default();
    let mut pipeline = ChordPipeline::new(SAMPLE_RATE, &config.chord_detection).unwrap();
    pipeline.on_stream_connected();
    assert!(pipeline.is_calibrating());

    // 30 windows of room noise covers the 25-frame calibration
    let noise = white_noise(0.01, pipeline.window_size() * 30, NOISE_SEED);
    let mut outcomes = Vec::new();
    for chunk in noise.chunks(1024) {
        outcomes.extend(pipeline.push_samples(chunk).into_iter().map(|f| f.outcome));
    }

    assert!(matches!(
        outcomes[0],
        ChordFrameOutcome::Calibrating { collected: 1, needed: 25 }
    ));
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, ChordFrameOutcome::Calibrated))
            .count(),
        1
    );
    assert!(!pipeline.is_calibrating());

    let result = last_chord_match(&mut pipeline, &em_triad(SAMPLE_RATE as usize)).unwrap();
    assert_eq!(result.chord, "Em");
}

#[test]
fn test_chord_pipeline_reports_nothing_for_silence() {
    let config = AppConfig::default();
    let mut pipeline = ChordPipeline::new(SAMPLE_RATE, &config.chord_detection).unwrap();
    assert!(last_chord_match(&mut pipeline, &vec![0.0; 44_100]).is_none());
    assert!(pipeline.current_match().is_none());
}

#[test]
fn test_open_a_string_resolves_to_fret_zero() {
    let config = AppConfig::default();
    let data = "sine:110"
        .parse::<FixtureSource>()
        .unwrap()
        .load()
        .unwrap();

    let mut pipeline = NotePipeline::new(data.sample_rate, &config.note_detection);
    let mut notes = Vec::new();
    for chunk in data.samples.chunks(1024) {
        notes.extend(pipeline.push_samples(chunk).into_iter().filter_map(|f| f.note));
    }

    assert!(!notes.is_empty());
    for note in notes {
        assert_eq!(note.midi, 45);
        assert_eq!(note.string, GuitarString::A);
        assert_eq!(note.fret, 0);
    }
}

#[test]
fn test_open_strings_resolve_to_their_own_string() {
    let config = AppConfig::default();
    for (hz, string) in [(82.41_f32, GuitarString::LowE), (196.0, GuitarString::G)] {
        let mut pipeline = NotePipeline::new(SAMPLE_RATE, &config.note_detection);
        pipeline.push_samples(&sine(hz, 0.5, SAMPLE_RATE, 8_192));

        let note = pipeline.current_match().cloned().unwrap();
        assert_eq!(note.string, string, "{} Hz", hz);
        assert_eq!(note.fret, 0);
    }
}

#[test]
fn test_note_pipeline_ignores_silence() {
    let config = AppConfig::default();
    let mut pipeline = NotePipeline::new(SAMPLE_RATE, &config.note_detection);
    let frames = pipeline.push_samples(&vec![0.0; 8_192]);
    assert!(!frames.is_empty());
    assert!(frames.iter().all(|f| f.note.is_none()));
}

#[test]
fn test_tuner_reads_open_a_from_pitch_frames() {
    let config = AppConfig::default();
    let extractor = PitchFrameExtractor::new(config.tuner.buffer_size, SAMPLE_RATE);
    let frame = extractor.extract(&sine(110.0, 0.5, SAMPLE_RATE, config.tuner.buffer_size));

    let reading = Tuner::new(config.tuner.clone())
        .read(frame.frequency_hz, frame.clarity)
        .unwrap();
    assert_eq!(reading.note, "A");
    assert_eq!(reading.octave, 2);
    assert_eq!(reading.nearest_string, GuitarString::A);
    assert_eq!(reading.status, TuningStatus::InTune);
}

#[test]
fn test_flashcard_confirms_after_continuous_hold() {
    let config = AppConfig::default();
    let mut judge = FlashcardJudge::new(config.flashcard.clone(), "G");
    let g = ChordMatch {
        chord: "G".to_string(),
        confidence: 0.8,
    };

    let mut now = 0.0;
    let mut last = judge.tick(now, Some(&g));
    while now < 1_600.0 {
        now += 50.0;
        last = judge.tick(now, Some(&g));
    }

    match last.status {
        FlashcardStatus::Confirmed { confidence } => assert!((confidence - 0.8).abs() < 1e-5),
        other => panic!("expected confirmation, got {:?}", other),
    }
    assert!(judge.is_confirmed());
}
