//! Telemetry event types published by sessions, pipelines and the CLI.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationProgress;
use crate::highway::{RunState, ScoreEvent, SessionSummary};

/// Which detector produced a detection event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Chord,
    Note,
}

/// Events covering scoring, calibration, detection changes and run lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    Score(ScoreEvent),
    Calibration(CalibrationProgress),
    /// The live match changed; `label` is `None` when detection dropped out
    Detection {
        detector: DetectorKind,
        label: Option<String>,
        confidence: f32,
    },
    Run {
        state: RunState,
        game_time_ms: f64,
    },
    Summary(SessionSummary),
    BufferOccupancy {
        channel: String,
        percent: f32,
    },
    Error {
        code: i32,
        context: String,
    },
}
