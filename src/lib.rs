// Fret Trainer Core - guitar chord/note recognition and timed practice runs
// Spectral detection pipelines feeding a scrolling "highway" scheduler

// Module declarations
pub mod analysis;
pub mod audio;
pub mod calibration;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod highway;
pub mod session;
pub mod telemetry;
pub mod theory;

// Re-exports for convenience
pub use analysis::{ChordMatch, ChordPipeline, NoteMatch, NotePipeline, Tuner};
pub use config::AppConfig;
pub use error::{AudioError, CalibrationError, ErrorCode, SessionError};
pub use highway::{HighwayScheduler, PracticeMode, RunState, TargetSequence};
pub use session::{Detector, PracticeSession};
