use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use fret_trainer::analysis::features::{FrameAssembler, PitchFrame, PitchFrameExtractor};
use fret_trainer::analysis::{ChordPipeline, NotePipeline, Tuner, TunerReading};
use fret_trainer::config::{AppConfig, HighwayConfig};
use fret_trainer::fixtures::{FixtureData, FixtureSource};
use fret_trainer::highway::{
    expand, run_duration_ms, BlockStatus, BlockTarget, ChordStep, PracticeMode, RunState,
    SequenceKind, TargetSequence,
};
use fret_trainer::session::PracticeSession;
use fret_trainer::telemetry::{self, MetricEvent};
use fret_trainer::theory::{
    builtin_catalog, chord, curriculum, fretted_midi, midi_to_frequency, StringState,
};

/// Samples handed to a pipeline per call when replaying a fixture
const ANALYZE_CHUNK: usize = 1024;

#[derive(Parser, Debug)]
#[command(
    name = "fret_cli",
    about = "Chord/note recognition and practice-run harness for Fret Trainer"
)]
struct Cli {
    /// JSON config file (defaults to assets/trainer_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the chord dictionary in curriculum order
    Chords,
    /// List built-in songs and fingerpick patterns
    Songs,
    /// Print the expanded block schedule as JSON lines
    Schedule(SequenceArgs),
    /// Run a WAV file or synthetic signal through a detection pipeline
    Analyze(AnalyzeArgs),
    /// Play a scripted run against a synthetic detection stream
    Simulate(SimulateArgs),
    /// Detect from the default microphone
    Listen(ListenArgs),
    /// Tuner readings from a fixture, or the microphone when no input is given
    Tune(TuneArgs),
}

#[derive(Args, Debug, Clone)]
struct SequenceArgs {
    /// Chord progression such as "Em:4,Am:4,D:4,G:4" (beats default to 4)
    #[arg(long, conflicts_with_all = ["song", "pattern"])]
    progression: Option<String>,
    /// Melody id from the song catalog
    #[arg(long, conflicts_with = "pattern")]
    song: Option<String>,
    /// Fingerpick pattern id from the song catalog
    #[arg(long)]
    pattern: Option<String>,
    /// Tempo override; defaults to the catalog tempo or 80 for progressions
    #[arg(long)]
    bpm: Option<f64>,
    /// Loop override; defaults per sequence kind from the config
    #[arg(long)]
    loops: Option<u32>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DetectMode {
    Chord,
    Note,
    Tuner,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// WAV path, or sine:<hz>, chord:<name>, noise, silence
    #[arg(long)]
    input: String,
    #[arg(long, value_enum, default_value_t = DetectMode::Chord)]
    mode: DetectMode,
    /// Length of synthetic inputs
    #[arg(long, default_value_t = 2_000)]
    duration_ms: u32,
    /// Calibrate the chord detector on the first frames of the input
    #[arg(long)]
    calibrate: bool,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    sequence: SequenceArgs,
    #[arg(long, default_value = "practice")]
    mode: PracticeMode,
    /// Render tick interval
    #[arg(long, default_value_t = 16.0)]
    tick_ms: f64,
    /// Block ids the simulated player stays silent for on the first pass
    #[arg(long, value_delimiter = ',')]
    miss: Vec<usize>,
}

#[derive(Args, Debug)]
struct ListenArgs {
    #[arg(long, value_enum, default_value_t = DetectMode::Chord)]
    mode: DetectMode,
    #[arg(long, default_value_t = 10)]
    seconds: u64,
}

#[derive(Args, Debug)]
struct TuneArgs {
    /// WAV path or synthetic source; listens live when omitted
    #[arg(long)]
    input: Option<String>,
    #[arg(long, default_value_t = 2_000)]
    duration_ms: u32,
    #[arg(long, default_value_t = 10)]
    seconds: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fret_cli error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);

    match cli.command {
        Command::Chords => run_chords(),
        Command::Songs => run_songs(),
        Command::Schedule(args) => run_schedule(&config, &args),
        Command::Analyze(args) => run_analyze(&config, &args),
        Command::Simulate(args) => run_simulate(&config, &args),
        Command::Listen(args) => run_listen(&config, args.mode, args.seconds),
        Command::Tune(args) => match args.input {
            Some(input) => {
                let data = load_fixture(&input, args.duration_ms)?;
                run_tuner_offline(&config, &data)
            }
            None => run_listen(&config, DetectMode::Tuner, args.seconds),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn run_chords() -> Result<()> {
    for template in curriculum() {
        let shape: String = template
            .open_strings
            .iter()
            .map(|state| match state {
                StringState::Muted => "x".to_string(),
                StringState::Open => "0".to_string(),
                StringState::Fretted(fret) => fret.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        println!("{:<6} {:<14} {}", template.name, template.display_name, shape);
    }
    Ok(())
}

fn run_songs() -> Result<()> {
    let catalog = builtin_catalog();
    for song in &catalog.songs {
        println!(
            "song     {:<20} {:<28} {:?} {} BPM, {} notes",
            song.id,
            song.title,
            song.difficulty,
            song.bpm,
            song.note_count()
        );
    }
    for pattern in &catalog.patterns {
        println!(
            "pattern  {:<20} {:<28} {:?} {} BPM over {}",
            pattern.id, pattern.title, pattern.difficulty, pattern.bpm, pattern.chord_name
        );
    }
    Ok(())
}

fn parse_progression(spec: &str) -> Result<Vec<ChordStep>> {
    spec.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once(':') {
            Some((name, beats)) => {
                let beats = beats
                    .parse::<f64>()
                    .with_context(|| format!("invalid beat count in '{}'", part))?;
                Ok(ChordStep::new(name, beats))
            }
            None => Ok(ChordStep::new(part, 4.0)),
        })
        .collect()
}

impl SequenceArgs {
    fn resolve(&self, config: &HighwayConfig) -> Result<(TargetSequence, f64, u32)> {
        let catalog = builtin_catalog();
        let (sequence, default_bpm) = if let Some(spec) = &self.progression {
            (TargetSequence::Progression(parse_progression(spec)?), 80.0)
        } else if let Some(id) = &self.song {
            let song = catalog
                .song(id)
                .ok_or_else(|| anyhow!("unknown song '{}'", id))?;
            (TargetSequence::from_song(song), song.bpm)
        } else if let Some(id) = &self.pattern {
            let pattern = catalog
                .pattern(id)
                .ok_or_else(|| anyhow!("unknown pattern '{}'", id))?;
            let sequence = TargetSequence::from_pattern(pattern);
            let loops = self.loops.unwrap_or(pattern.loops);
            return Ok((sequence, self.bpm.unwrap_or(pattern.bpm), loops));
        } else {
            bail!("one of --progression, --song or --pattern is required");
        };

        let loops = self.loops.unwrap_or_else(|| sequence.default_loops(config));
        Ok((sequence, self.bpm.unwrap_or(default_bpm), loops))
    }
}

fn run_schedule(config: &AppConfig, args: &SequenceArgs) -> Result<()> {
    let (sequence, bpm, loops) = args.resolve(&config.highway)?;
    let blocks = expand(&sequence, bpm, loops, &config.highway)
        .map_err(|err| anyhow!("{}", err))
        .context("expanding schedule")?;

    for block in &blocks {
        print_json(block)?;
    }
    tracing::info!(
        "{} blocks, run duration {} ms",
        blocks.len(),
        run_duration_ms(&blocks, config.highway.travel_duration_ms)
    );
    Ok(())
}

fn load_fixture(input: &str, duration_ms: u32) -> Result<FixtureData> {
    let source: FixtureSource = input
        .parse()
        .map_err(|err| anyhow!("{}", err))
        .with_context(|| format!("parsing input '{}'", input))?;
    let source = match source {
        FixtureSource::Synthetic(spec) => {
            FixtureSource::Synthetic(spec.with_duration_ms(duration_ms))
        }
        wav => wav,
    };
    source
        .load()
        .map_err(|err| anyhow!("{}", err))
        .with_context(|| format!("loading input '{}'", input))
}

fn run_analyze(config: &AppConfig, args: &AnalyzeArgs) -> Result<()> {
    let data = load_fixture(&args.input, args.duration_ms)?;
    tracing::info!(
        "Analyzing {} samples at {} Hz ({:.0} ms)",
        data.samples.len(),
        data.sample_rate,
        data.duration_ms()
    );

    match args.mode {
        DetectMode::Chord => {
            let mut pipeline = ChordPipeline::new(data.sample_rate, &config.chord_detection)
                .map_err(|err| anyhow!("{}", err))?;
            if args.calibrate {
                pipeline.start_calibration();
            }
            for chunk in data.samples.chunks(ANALYZE_CHUNK) {
                for frame in pipeline.push_samples(chunk) {
                    print_json(&frame)?;
                }
            }
        }
        DetectMode::Note => {
            let mut pipeline = NotePipeline::new(data.sample_rate, &config.note_detection);
            for chunk in data.samples.chunks(ANALYZE_CHUNK) {
                for frame in pipeline.push_samples(chunk) {
                    print_json(&frame)?;
                }
            }
        }
        DetectMode::Tuner => run_tuner_offline(config, &data)?,
    }
    Ok(())
}

#[derive(Serialize)]
struct TunerLine<'a> {
    time_ms: f64,
    frame: PitchFrame,
    reading: Option<&'a TunerReading>,
}

/// Pitch frames sized for the tuner window with half-window hop
struct TunerChain {
    assembler: FrameAssembler,
    extractor: PitchFrameExtractor,
    tuner: Tuner,
    sample_rate: u32,
    windows: u64,
}

impl TunerChain {
    fn new(config: &AppConfig, sample_rate: u32) -> Self {
        let size = config.tuner.buffer_size;
        Self {
            assembler: FrameAssembler::new(size, (size / 2).max(1)),
            extractor: PitchFrameExtractor::new(size, sample_rate),
            tuner: Tuner::new(config.tuner.clone()),
            sample_rate,
            windows: 0,
        }
    }

    fn push<F>(&mut self, samples: &[f32], mut emit: F) -> Result<()>
    where
        F: FnMut(f64, PitchFrame, Option<TunerReading>) -> Result<()>,
    {
        for window in self.assembler.push(samples) {
            let end = self.windows * self.assembler.hop_size() as u64
                + self.assembler.window_size() as u64;
            self.windows += 1;
            let frame = self.extractor.extract(&window);
            let reading = self.tuner.read(frame.frequency_hz, frame.clarity);
            emit(end as f64 * 1000.0 / self.sample_rate as f64, frame, reading)?;
        }
        Ok(())
    }
}

fn run_tuner_offline(config: &AppConfig, data: &FixtureData) -> Result<()> {
    let mut chain = TunerChain::new(config, data.sample_rate);
    for chunk in data.samples.chunks(ANALYZE_CHUNK) {
        chain.push(chunk, |time_ms, frame, reading| {
            print_json(&TunerLine {
                time_ms,
                frame,
                reading: reading.as_ref(),
            })
        })?;
    }
    Ok(())
}

/// What the scripted player sounds like while aiming at `target`
enum Stimulus {
    Chroma([f32; 12]),
    Pitch(PitchFrame),
}

fn stimulus_for(kind: SequenceKind, target: Option<&BlockTarget>) -> Stimulus {
    match target {
        Some(BlockTarget::Chord { name }) => {
            Stimulus::Chroma(chord(name).map(|t| t.chroma).unwrap_or([0.0; 12]))
        }
        Some(BlockTarget::Note { string, fret }) => {
            let hz = midi_to_frequency(fretted_midi(*string, *fret) as f64) as f32;
            Stimulus::Pitch(PitchFrame::new(hz, 0.99, 0.1))
        }
        Some(BlockTarget::PickString { string }) => {
            Stimulus::Pitch(PitchFrame::new(string.open_frequency_hz() as f32, 0.99, 0.1))
        }
        None => match kind {
            SequenceKind::Chords => Stimulus::Chroma([0.0; 12]),
            SequenceKind::Notes => Stimulus::Pitch(PitchFrame::new(0.0, 0.0, 0.0)),
        },
    }
}

#[derive(Serialize)]
struct RunLine {
    state: RunState,
    game_time_ms: f64,
}

fn run_simulate(config: &AppConfig, args: &SimulateArgs) -> Result<()> {
    if args.tick_ms <= 0.0 {
        bail!("--tick-ms must be positive");
    }
    let (sequence, bpm, loops) = args.sequence.resolve(&config.highway)?;

    let mut session = match sequence.kind() {
        SequenceKind::Chords => {
            PracticeSession::for_chords(config, 44_100).map_err(|err| anyhow!("{}", err))?
        }
        SequenceKind::Notes => PracticeSession::for_notes(config, 44_100),
    };

    let mut telemetry_rx = telemetry::hub().subscribe();
    session
        .start(&sequence, bpm, loops, args.mode, 0.0)
        .map_err(|err| anyhow!("{}", err))
        .context("starting run")?;

    let silent_for: HashSet<usize> = args.miss.iter().copied().collect();
    let limit_ms = session.scheduler().run_duration_ms() * 4.0 + 10_000.0;
    let mut state = session.state();
    let mut tally = TelemetryTally::default();
    let mut now = 0.0;

    while now <= limit_ms && !session.scheduler().is_complete() {
        let aim = session
            .scheduler()
            .upcoming(now, 1)
            .first()
            .filter(|block| {
                block.status == BlockStatus::PendingRetry || !silent_for.contains(&block.id)
            })
            .map(|block| block.target.clone());

        match stimulus_for(sequence.kind(), aim.as_ref()) {
            Stimulus::Chroma(frame) => session.on_chroma_frame(&frame),
            Stimulus::Pitch(frame) => session.on_pitch_frame(&frame, now),
        }

        let tick = session.on_tick(now);
        for event in &tick.events {
            print_json(event)?;
        }
        tally.drain(&mut telemetry_rx);
        if tick.state != state {
            state = tick.state;
            print_json(&RunLine {
                state,
                game_time_ms: tick.game_time_ms,
            })?;
        }
        now += args.tick_ms;
    }

    match session.stop(now) {
        Some(summary) => print_json(&summary)?,
        None => tracing::warn!("Run ended with no judged targets"),
    }
    tally.drain(&mut telemetry_rx);
    tracing::info!("Telemetry: {:?}", tally);
    Ok(())
}

/// Event counts observed on the telemetry broadcast during a run
#[derive(Debug, Default, Clone, PartialEq)]
struct TelemetryTally {
    scores: usize,
    run_changes: usize,
    detections: usize,
    calibrations: usize,
    summaries: usize,
    other: usize,
    lagged: u64,
}

impl TelemetryTally {
    /// Count everything currently queued without blocking
    fn drain(&mut self, rx: &mut tokio::sync::broadcast::Receiver<MetricEvent>) {
        use tokio::sync::broadcast::error::TryRecvError;

        loop {
            match rx.try_recv() {
                Ok(event) => self.count(&event),
                Err(TryRecvError::Lagged(skipped)) => self.lagged += skipped,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn count(&mut self, event: &MetricEvent) {
        match event {
            MetricEvent::Score(_) => self.scores += 1,
            MetricEvent::Run { .. } => self.run_changes += 1,
            MetricEvent::Detection { .. } => self.detections += 1,
            MetricEvent::Calibration(_) => self.calibrations += 1,
            MetricEvent::Summary(_) => self.summaries += 1,
            _ => self.other += 1,
        }
    }
}

#[cfg(not(target_os = "android"))]
fn run_listen(config: &AppConfig, mode: DetectMode, seconds: u64) -> Result<()> {
    use fret_trainer::audio::{BufferPool, LiveInput, DEFAULT_BUFFER_COUNT, DEFAULT_BUFFER_SIZE};
    use std::time::{Duration, Instant};

    let (capture, mut analysis) = BufferPool::new(DEFAULT_BUFFER_COUNT, DEFAULT_BUFFER_SIZE).split();
    let mut input = LiveInput::start(capture)
        .map_err(|err| anyhow!("{}", err))
        .context("opening microphone")?;
    let sample_rate = input.sample_rate();

    enum Listener {
        Chord(ChordPipeline),
        Note(NotePipeline),
        Tuner(TunerChain),
    }

    let mut listener = match mode {
        DetectMode::Chord => {
            let mut pipeline = ChordPipeline::new(sample_rate, &config.chord_detection)
                .map_err(|err| anyhow!("{}", err))?;
            pipeline.on_stream_connected();
            Listener::Chord(pipeline)
        }
        DetectMode::Note => Listener::Note(NotePipeline::new(sample_rate, &config.note_detection)),
        DetectMode::Tuner => Listener::Tuner(TunerChain::new(config, sample_rate)),
    };

    let started = Instant::now();
    let mut last_label: Option<String> = None;
    let mut failure: Option<anyhow::Error> = None;

    while started.elapsed() < Duration::from_secs(seconds) && failure.is_none() {
        std::thread::sleep(Duration::from_millis(10));
        telemetry::hub().record_buffer_occupancy("capture", analysis.occupancy_percent());

        analysis.drain(|samples| {
            let label = match &mut listener {
                Listener::Chord(pipeline) => {
                    pipeline.push_samples(samples);
                    pipeline
                        .current_match()
                        .map(|m| format!("{} ({:.2})", m.chord, m.confidence))
                }
                Listener::Note(pipeline) => {
                    pipeline.push_samples(samples);
                    pipeline
                        .current_match()
                        .map(|m| format!("{} fret {} ({:.1} Hz)", m.string, m.fret, m.frequency_hz))
                }
                Listener::Tuner(chain) => {
                    let mut latest = None;
                    if let Err(err) = chain.push(samples, |_, _, reading| {
                        latest = reading;
                        Ok(())
                    }) {
                        failure = Some(err);
                    }
                    latest.map(|r| {
                        format!(
                            "{}{} {:+.0} cents, {:.1} Hz, nearest {} [{:?}]",
                            r.note, r.octave, r.cents, r.frequency_hz, r.nearest_string, r.status
                        )
                    })
                }
            };

            if label != last_label {
                match &label {
                    Some(text) => println!("{}", text),
                    None => println!("-"),
                }
                last_label = label;
            }
        });
    }

    input.stop().map_err(|err| anyhow!("{}", err))?;
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(target_os = "android")]
fn run_listen(_config: &AppConfig, _mode: DetectMode, _seconds: u64) -> Result<()> {
    bail!("live input is not available on this platform")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progression_defaults_beats() {
        let steps = parse_progression("Em:2, Am ,D:4").unwrap();
        assert_eq!(
            steps,
            vec![
                ChordStep::new("Em", 2.0),
                ChordStep::new("Am", 4.0),
                ChordStep::new("D", 4.0),
            ]
        );
        assert!(parse_progression("Em:x").is_err());
    }

    #[test]
    fn test_telemetry_tally_counts_broadcast_events() {
        use fret_trainer::highway::{ScoreEvent, SessionSummary};
        use fret_trainer::telemetry::TelemetryHub;

        let hub = TelemetryHub::new(16, 16);
        let mut rx = hub.subscribe();
        let target = BlockTarget::Chord {
            name: "Em".to_string(),
        };
        hub.record_run_state(RunState::Running, 0.0);
        hub.record_score(&ScoreEvent {
            hit: true,
            target,
            block_id: 0,
            game_time_ms: 4_000.0,
            score_delta: 10,
        });
        hub.record_summary(&SessionSummary {
            mode: PracticeMode::Test,
            targets_played: 1,
            score: 10,
            hits: 1,
            misses: 0,
            accuracy: 100,
        });

        let mut tally = TelemetryTally::default();
        tally.drain(&mut rx);
        assert_eq!(tally.run_changes, 1);
        assert_eq!(tally.scores, 1);
        assert_eq!(tally.summaries, 1);
        assert_eq!(tally.lagged, 0);

        // Nothing new queued
        tally.drain(&mut rx);
        assert_eq!(tally.scores, 1);
    }

    #[test]
    fn test_cli_parses_simulate() {
        let cli = Cli::try_parse_from([
            "fret_cli",
            "simulate",
            "--progression",
            "Em,Am",
            "--mode",
            "test",
            "--miss",
            "1,3",
        ])
        .unwrap();
        match cli.command {
            Command::Simulate(args) => {
                assert_eq!(args.mode, PracticeMode::Test);
                assert_eq!(args.miss, vec![1, 3]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
