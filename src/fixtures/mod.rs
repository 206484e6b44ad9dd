//! Deterministic PCM sources for the CLI harness and integration tests.
//!
//! A fixture is either a WAV file on disk or a synthetic signal (sine, a
//! strummed chord voicing, seeded white noise, silence). Everything decodes
//! to mono f32 so it can be pushed straight into a detection pipeline.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::AudioError;
use crate::theory::{chord, fretted_midi, midi_to_frequency, GuitarString, StringState};

/// Sample rate used when a synthetic fixture does not name one.
pub const FIXTURE_SAMPLE_RATE: u32 = 44_100;

/// Seed for noise fixtures so repeated runs produce identical samples.
pub const NOISE_SEED: u64 = 0x5A5A_FFF0;

/// Where fixture samples come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FixtureSource {
    WavFile { path: PathBuf },
    Synthetic(SyntheticSpec),
}

/// A generated signal of fixed length.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntheticSpec {
    pub pattern: SyntheticPattern,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u32,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum SyntheticPattern {
    Sine { frequency_hz: f32 },
    /// Every sounding string of a dictionary chord, summed
    Chord { name: String },
    WhiteNoise,
    Silence,
}

fn default_amplitude() -> f32 {
    0.5
}

fn default_duration_ms() -> u32 {
    2_000
}

fn default_sample_rate() -> u32 {
    FIXTURE_SAMPLE_RATE
}

/// Decoded mono samples.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureData {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl FixtureData {
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 * 1_000.0 / self.sample_rate as f64
    }
}

impl SyntheticSpec {
    pub fn new(pattern: SyntheticPattern) -> Self {
        Self {
            pattern,
            amplitude: default_amplitude(),
            duration_ms: default_duration_ms(),
            sample_rate: default_sample_rate(),
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    fn frame_count(&self) -> usize {
        ((self.duration_ms as f64 / 1_000.0) * self.sample_rate as f64).round() as usize
    }

    pub fn render(&self) -> Result<FixtureData, AudioError> {
        if self.sample_rate == 0 {
            return Err(AudioError::FixtureLoadFailed {
                reason: "fixture sample rate must be > 0".to_string(),
            });
        }

        let frames = self.frame_count();
        let samples = match &self.pattern {
            SyntheticPattern::Sine { frequency_hz } => {
                sine(*frequency_hz, self.amplitude, self.sample_rate, frames)
            }
            SyntheticPattern::Chord { name } => {
                chord_tone(name, self.amplitude, self.sample_rate, frames).ok_or_else(|| {
                    AudioError::FixtureLoadFailed {
                        reason: format!("unknown chord '{}'", name),
                    }
                })?
            }
            SyntheticPattern::WhiteNoise => white_noise(self.amplitude, frames, NOISE_SEED),
            SyntheticPattern::Silence => vec![0.0; frames],
        };

        Ok(FixtureData {
            sample_rate: self.sample_rate,
            samples,
        })
    }
}

impl FixtureSource {
    pub fn load(&self) -> Result<FixtureData, AudioError> {
        match self {
            FixtureSource::WavFile { path } => read_wav(path),
            FixtureSource::Synthetic(spec) => spec.render(),
        }
    }
}

impl FromStr for FixtureSource {
    type Err = AudioError;

    /// `sine:<hz>`, `chord:<name>`, `noise`, `silence`, or a WAV path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (s, None),
        };

        let pattern = match (kind, arg) {
            ("sine", Some(hz)) => {
                let frequency_hz = hz.parse::<f32>().map_err(|_| AudioError::FixtureLoadFailed {
                    reason: format!("invalid sine frequency '{}'", hz),
                })?;
                SyntheticPattern::Sine { frequency_hz }
            }
            ("chord", Some(name)) => SyntheticPattern::Chord {
                name: name.to_string(),
            },
            ("noise", None) => SyntheticPattern::WhiteNoise,
            ("silence", None) => SyntheticPattern::Silence,
            _ => {
                return Ok(FixtureSource::WavFile {
                    path: PathBuf::from(s),
                })
            }
        };

        Ok(FixtureSource::Synthetic(SyntheticSpec::new(pattern)))
    }
}

pub fn sine(frequency_hz: f32, amplitude: f32, sample_rate: u32, frames: usize) -> Vec<f32> {
    let step = frequency_hz / sample_rate as f32;
    (0..frames)
        .map(|i| (2.0 * PI * step * i as f32).sin() * amplitude)
        .collect()
}

/// Sum of the open/fretted string fundamentals of `name`, normalized so the
/// peak stays near `amplitude`. `None` for chords not in the dictionary.
pub fn chord_tone(name: &str, amplitude: f32, sample_rate: u32, frames: usize) -> Option<Vec<f32>> {
    let template = chord(name)?;

    // open_strings[0] is the low E string, GuitarString::ALL starts at high e
    let frequencies: Vec<f32> = template
        .open_strings
        .iter()
        .zip(GuitarString::ALL.iter().rev())
        .filter_map(|(state, &string)| match *state {
            StringState::Muted => None,
            StringState::Open => Some(fretted_midi(string, 0)),
            StringState::Fretted(fret) => Some(fretted_midi(string, fret)),
        })
        .map(|midi| midi_to_frequency(midi as f64) as f32)
        .collect();

    if frequencies.is_empty() {
        return Some(vec![0.0; frames]);
    }

    let per_string = amplitude / frequencies.len() as f32;
    let mut samples = vec![0.0_f32; frames];
    for frequency in frequencies {
        for (sample, tone) in samples
            .iter_mut()
            .zip(sine(frequency, per_string, sample_rate, frames))
        {
            *sample += tone;
        }
    }
    Some(samples)
}

pub fn white_noise(amplitude: f32, frames: usize, seed: u64) -> Vec<f32> {
    if amplitude <= 0.0 {
        return vec![0.0; frames];
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..frames)
        .map(|_| rng.gen_range(-amplitude..amplitude))
        .collect()
}

fn load_failed(path: &Path, err: impl std::fmt::Display) -> AudioError {
    AudioError::FixtureLoadFailed {
        reason: format!("{}: {}", path.display(), err),
    }
}

/// Decode a PCM or float WAV file, down-mixing to mono.
pub fn read_wav(path: &Path) -> Result<FixtureData, AudioError> {
    let mut reader = hound::WavReader::open(path).map_err(|err| load_failed(path, err))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(load_failed(path, "zero channels"));
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(|err| load_failed(path, err)))
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|sample| {
                    sample
                        .map(|v| v as f32 / i16::MAX as f32)
                        .map_err(|err| load_failed(path, err))
                })
                .collect::<Result<Vec<f32>, _>>()?,
            24 | 32 => {
                let full_scale = ((1_i64 << (spec.bits_per_sample - 1)) - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| {
                        sample
                            .map(|v| v as f32 / full_scale)
                            .map_err(|err| load_failed(path, err))
                    })
                    .collect::<Result<Vec<f32>, _>>()?
            }
            bits => {
                return Err(load_failed(
                    path,
                    format!("unsupported bits_per_sample={}", bits),
                ))
            }
        },
    };

    let channels = spec.channels as usize;
    let samples = if channels == 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(FixtureData {
        sample_rate: spec.sample_rate,
        samples,
    })
}
