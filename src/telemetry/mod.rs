//! Session telemetry collector and helpers.
//!
//! The collector multiplexes score, calibration, detection and run lifecycle
//! events into a bounded history plus a broadcast stream that any number of
//! observers (CLI printers, persistence adapters) can subscribe to.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

use crate::calibration::CalibrationProgress;
use crate::error::ErrorCode;
use crate::highway::{RunState, ScoreEvent, SessionSummary};

pub mod events;

pub use events::{DetectorKind, MetricEvent};

/// Global telemetry hub shared across the crate.
static HUB: Lazy<TelemetryHub> = Lazy::new(TelemetryHub::default);

/// Access the global telemetry hub.
pub fn hub() -> &'static TelemetryHub {
    &HUB
}

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

// A panic while holding a telemetry lock leaves plain data behind; keep using it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Broadcast-based collector retaining a bounded history of events.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        let history_capacity = history_capacity.max(1);
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = lock(&self.history);
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = lock(&self.history);
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Top-level hub wrapping the collector plus change-detection state.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    last_detection: Mutex<HashMap<DetectorKind, Option<String>>>,
    buffer_gauges: Mutex<HashMap<&'static str, f32>>,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            last_detection: Mutex::new(HashMap::new()),
            buffer_gauges: Mutex::new(HashMap::new()),
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.collector.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.collector.snapshot()
    }

    pub fn record_score(&self, event: &ScoreEvent) {
        self.collector.publish(MetricEvent::Score(event.clone()));
    }

    pub fn record_calibration(&self, progress: &CalibrationProgress) {
        self.collector
            .publish(MetricEvent::Calibration(progress.clone()));
    }

    /// Publish a detection only when its label differs from the last one
    pub fn record_detection(&self, detector: DetectorKind, label: Option<String>, confidence: f32) {
        let mut last = lock(&self.last_detection);
        if last.get(&detector) == Some(&label) {
            return;
        }
        last.insert(detector, label.clone());
        drop(last);

        self.collector.publish(MetricEvent::Detection {
            detector,
            label,
            confidence,
        });
    }

    pub fn record_run_state(&self, state: RunState, game_time_ms: f64) {
        self.collector.publish(MetricEvent::Run {
            state,
            game_time_ms,
        });
    }

    pub fn record_summary(&self, summary: &SessionSummary) {
        self.collector
            .publish(MetricEvent::Summary(summary.clone()));
    }

    pub fn record_buffer_occupancy(&self, channel: &'static str, percent: f32) {
        let normalized = percent.clamp(0.0, 100.0);
        let mut gauges = lock(&self.buffer_gauges);

        let should_emit = gauges
            .get(channel)
            .map(|last| (last - normalized).abs() >= 2.5)
            .unwrap_or(true);

        if should_emit {
            gauges.insert(channel, normalized);
            self.collector.publish(MetricEvent::BufferOccupancy {
                channel: channel.to_string(),
                percent: normalized,
            });
        }
    }

    pub fn record_error(&self, error: &dyn ErrorCode, context: impl Into<String>) {
        self.collector.publish(MetricEvent::Error {
            code: error.code(),
            context: context.into(),
        });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::highway::BlockTarget;

    fn score(block_id: usize, hit: bool) -> ScoreEvent {
        ScoreEvent {
            hit,
            target: BlockTarget::Chord {
                name: "G".to_string(),
            },
            block_id,
            game_time_ms: 4_000.0,
            score_delta: if hit { 10 } else { 0 },
        }
    }

    #[test]
    fn test_collector_preserves_order_within_history() {
        let collector = TelemetryCollector::new(8, 3);
        collector.publish(MetricEvent::Score(score(0, true)));
        collector.publish(MetricEvent::Run {
            state: RunState::Running,
            game_time_ms: 0.0,
        });
        collector.publish(MetricEvent::BufferOccupancy {
            channel: "test".to_string(),
            percent: 50.0,
        });

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 3);
        assert!(matches!(snapshot.recent[0], MetricEvent::Score(ref e) if e.hit));
        assert!(matches!(
            snapshot.recent[2],
            MetricEvent::BufferOccupancy { .. }
        ));
    }

    #[test]
    fn test_collector_drops_history_when_full() {
        let collector = TelemetryCollector::new(8, 2);
        for id in 0..3 {
            collector.publish(MetricEvent::Score(score(id, true)));
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.total_events, 3);
        assert_eq!(snapshot.dropped_events, 1);
        assert!(matches!(snapshot.recent[0], MetricEvent::Score(ref e) if e.block_id == 1));
    }

    #[test]
    fn test_subscribers_receive_events() {
        let hub = TelemetryHub::new(8, 8);
        let mut rx = hub.subscribe();
        hub.record_score(&score(3, false));

        match rx.try_recv() {
            Ok(MetricEvent::Score(event)) => assert_eq!(event.block_id, 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_detection_only_published_on_change() {
        let hub = TelemetryHub::new(8, 8);
        hub.record_detection(DetectorKind::Chord, Some("Em".to_string()), 0.9);
        hub.record_detection(DetectorKind::Chord, Some("Em".to_string()), 0.95);
        hub.record_detection(DetectorKind::Chord, None, 0.0);
        hub.record_detection(DetectorKind::Note, None, 0.0);

        let detections = hub
            .snapshot()
            .recent
            .into_iter()
            .filter(|event| matches!(event, MetricEvent::Detection { .. }))
            .count();
        assert_eq!(detections, 3);
    }

    #[test]
    fn test_buffer_gauge_debounces_small_changes() {
        let hub = TelemetryHub::new(8, 8);
        hub.record_buffer_occupancy("queue", 10.0);
        hub.record_buffer_occupancy("queue", 10.5);
        hub.record_buffer_occupancy("queue", 25.0);

        let count = hub
            .snapshot()
            .recent
            .iter()
            .filter(|event| matches!(event, MetricEvent::BufferOccupancy { .. }))
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_errors_carry_codes() {
        let hub = TelemetryHub::new(8, 8);
        hub.record_error(&SessionError::ModeLocked, "set_mode");
        let snapshot = hub.snapshot();
        assert!(matches!(
            snapshot.recent[0],
            MetricEvent::Error { code: 3006, .. }
        ));
    }
}
