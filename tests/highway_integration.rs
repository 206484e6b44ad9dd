//! Integration tests for practice runs
//!
//! These tests drive `PracticeSession` the way a UI would: a detection
//! callback writes the live match and a ~60 Hz render tick advances the
//! scheduler. They cover:
//! - Schedule expansion for the reference progression
//! - Test-mode misses that never turn into hits
//! - Practice-mode pause/resume without time skew
//! - Complete runs with a simulated player, chords and notes

use fret_trainer::analysis::features::PitchFrame;
use fret_trainer::config::AppConfig;
use fret_trainer::highway::{
    expand, run_duration_ms, BlockStatus, BlockTarget, ChordStep, PracticeMode, RunState,
    TargetSequence,
};
use fret_trainer::session::PracticeSession;
use fret_trainer::theory::{chord, fretted_midi, midi_to_frequency, GuitarString, NoteEvent};

const TICK_MS: f64 = 16.0;

fn reference_progression() -> TargetSequence {
    TargetSequence::Progression(vec![
        ChordStep::new("Em", 4.0),
        ChordStep::new("Am", 4.0),
        ChordStep::new("D", 4.0),
        ChordStep::new("G", 4.0),
    ])
}

fn chord_session() -> PracticeSession {
    PracticeSession::for_chords(&AppConfig::default(), 44_100).unwrap()
}

fn play_chord(session: &mut PracticeSession, name: &str) {
    let frame = chord(name).unwrap().chroma;
    session.on_chroma_frame(&frame);
}

fn stay_silent(session: &mut PracticeSession) {
    session.on_chroma_frame(&[0.0; 12]);
}

/// Target of the block the player should be aiming at right now
fn aim(session: &PracticeSession, now: f64) -> Option<BlockTarget> {
    session
        .scheduler()
        .upcoming(now, 1)
        .first()
        .map(|block| block.target.clone())
}

#[test]
fn test_reference_progression_schedule() {
    let config = AppConfig::default();
    let blocks = expand(&reference_progression(), 80.0, 4, &config.highway).unwrap();

    assert_eq!(blocks.len(), 16);
    assert_eq!(blocks[0].arrival_ms, 4_000.0);
    assert_eq!(blocks[15].arrival_ms, 49_000.0);
    assert_eq!(
        run_duration_ms(&blocks, config.highway.travel_duration_ms),
        52_000.0
    );
}

#[test]
fn test_arrival_spacing_at_sixty_bpm() {
    let config = AppConfig::default();
    let blocks = expand(&reference_progression(), 60.0, 1, &config.highway).unwrap();

    assert_eq!(blocks.len(), 4);
    assert_eq!(blocks[1].arrival_ms - blocks[0].arrival_ms, 4.0 * 1_000.0);
}

#[test]
fn test_test_mode_miss_is_final() {
    let mut session = chord_session();
    session
        .start(&reference_progression(), 80.0, 1, PracticeMode::Test, 0.0)
        .unwrap();

    // Nothing played until block 0's window (arrival 4000 + 1200) has passed
    let mut now = 0.0;
    let mut missed_events = 0;
    while now <= 5_300.0 {
        stay_silent(&mut session);
        let tick = session.on_tick(now);
        missed_events += tick.events.iter().filter(|e| e.block_id == 0 && !e.hit).count();
        now += TICK_MS;
    }
    assert_eq!(missed_events, 1);
    assert_eq!(session.scheduler().blocks()[0].status, BlockStatus::Missed);
    assert_eq!(session.state(), RunState::Running);

    // Em is played late: block 0 stays missed
    for _ in 0..30 {
        play_chord(&mut session, "Em");
        let tick = session.on_tick(now);
        assert!(tick.events.iter().all(|e| e.block_id != 0));
        now += TICK_MS;
    }
    assert_eq!(session.scheduler().blocks()[0].status, BlockStatus::Missed);
    assert_eq!(session.score().misses, 1);
    assert_eq!(session.score().hits, 0);
}

#[test]
fn test_practice_mode_pause_and_resume_keep_game_time() {
    let mut session = chord_session();
    session
        .start(&reference_progression(), 80.0, 1, PracticeMode::Practice, 0.0)
        .unwrap();

    let mut now = 0.0;
    let mut paused_at = None;
    while paused_at.is_none() && now < 10_000.0 {
        stay_silent(&mut session);
        let tick = session.on_tick(now);
        if tick.state == RunState::PausedForRetry {
            paused_at = Some(tick.game_time_ms);
        }
        now += TICK_MS;
    }
    let paused_at = paused_at.unwrap();
    assert!(paused_at > 5_200.0);
    assert_eq!(
        session.scheduler().pending_retry().map(|b| b.id),
        Some(0)
    );

    // A long wait while paused does not advance game time
    now += 5_000.0;
    stay_silent(&mut session);
    let tick = session.on_tick(now);
    assert_eq!(tick.state, RunState::PausedForRetry);
    assert_eq!(tick.game_time_ms, paused_at);
    assert!(tick.events.is_empty());

    // Playing the pending chord resumes exactly where the clock froze
    let mut resumed = None;
    for _ in 0..30 {
        play_chord(&mut session, "Em");
        let tick = session.on_tick(now);
        if let Some(event) = tick.events.first() {
            resumed = Some((event.clone(), tick.game_time_ms));
            break;
        }
        now += TICK_MS;
    }
    let (event, game_time) = resumed.unwrap();
    assert!(event.hit);
    assert_eq!(event.block_id, 0);
    assert_eq!(event.game_time_ms, paused_at);
    assert_eq!(game_time, paused_at);
    assert_eq!(session.state(), RunState::Running);

    let later = session.on_tick(now + TICK_MS);
    assert!((later.game_time_ms - (paused_at + TICK_MS)).abs() < 1e-9);
}

#[test]
fn test_full_chord_run_with_perfect_player() {
    let mut session = chord_session();
    session
        .start(&reference_progression(), 80.0, 4, PracticeMode::Test, 0.0)
        .unwrap();

    let mut now = 0.0;
    while !session.scheduler().is_complete() && now < 60_000.0 {
        match aim(&session, now) {
            Some(BlockTarget::Chord { name }) => play_chord(&mut session, &name),
            _ => stay_silent(&mut session),
        }
        session.on_tick(now);
        now += TICK_MS;
    }

    assert!(session.scheduler().is_complete());
    let summary = session.stop(now).unwrap();
    assert_eq!(summary.mode, PracticeMode::Test);
    assert_eq!(summary.targets_played, 16);
    assert_eq!(summary.hits, 16);
    assert_eq!(summary.misses, 0);
    assert_eq!(summary.score, 160);
    assert_eq!(summary.accuracy, 100);
    assert_eq!(session.state(), RunState::Stopped);
    assert!(session.scheduler().blocks().is_empty());
}

#[test]
fn test_melody_run_scores_notes_and_skips_rests() {
    let config = AppConfig::default();
    let mut session = PracticeSession::for_notes(&config, 44_100);
    let melody = TargetSequence::Melody(vec![
        NoteEvent::Note {
            string: GuitarString::A,
            fret: 0,
            beats: 1.0,
        },
        NoteEvent::Rest { beats: 1.0 },
        NoteEvent::Note {
            string: GuitarString::D,
            fret: 2,
            beats: 1.0,
        },
    ]);
    let count = session
        .start(&melody, 120.0, 1, PracticeMode::Test, 0.0)
        .unwrap();
    assert_eq!(count, 2);

    let mut now = 0.0;
    while !session.scheduler().is_complete() && now < 10_000.0 {
        let frame = match aim(&session, now) {
            Some(BlockTarget::Note { string, fret }) => {
                let hz = midi_to_frequency(fretted_midi(string, fret) as f64) as f32;
                PitchFrame::new(hz, 0.99, 0.2)
            }
            _ => PitchFrame::new(0.0, 0.0, 0.0),
        };
        session.on_pitch_frame(&frame, now);
        session.on_tick(now);
        now += TICK_MS;
    }

    let summary = session.stop(now).unwrap();
    assert_eq!(summary.hits, 2);
    assert_eq!(summary.misses, 0);
}

#[test]
fn test_restart_discards_pending_retry() {
    let mut session = chord_session();
    session
        .start(&reference_progression(), 80.0, 1, PracticeMode::Practice, 0.0)
        .unwrap();

    let mut now = 0.0;
    while session.state() != RunState::PausedForRetry && now < 10_000.0 {
        stay_silent(&mut session);
        session.on_tick(now);
        now += TICK_MS;
    }
    assert_eq!(session.state(), RunState::PausedForRetry);

    session
        .start(&reference_progression(), 80.0, 1, PracticeMode::Practice, now)
        .unwrap();
    assert_eq!(session.state(), RunState::Running);
    assert!(session.scheduler().pending_retry().is_none());
    assert!(session
        .scheduler()
        .blocks()
        .iter()
        .all(|b| b.status == BlockStatus::Scheduled));

    let tick = session.on_tick(now + TICK_MS);
    assert!((tick.game_time_ms - TICK_MS).abs() < 1e-9);
}

#[test]
fn test_mode_switch_only_while_stopped() {
    let mut session = chord_session();
    session
        .start(&reference_progression(), 80.0, 1, PracticeMode::Practice, 0.0)
        .unwrap();
    assert!(session.set_mode(PracticeMode::Test).is_err());

    assert!(session.stop(100.0).is_none());
    assert!(session.set_mode(PracticeMode::Test).is_ok());
    assert_eq!(session.scheduler().mode(), PracticeMode::Test);
}

#[test]
fn test_invalid_tempo_keeps_previous_run() {
    let mut session = chord_session();
    session
        .start(&reference_progression(), 80.0, 1, PracticeMode::Test, 0.0)
        .unwrap();

    assert!(session
        .start(&reference_progression(), 0.0, 1, PracticeMode::Test, 10.0)
        .is_err());
    assert_eq!(session.state(), RunState::Running);
    assert_eq!(session.scheduler().blocks().len(), 4);
}
