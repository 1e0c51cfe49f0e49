use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::warn;

/// Loop health over the last completed interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    /// Longest single frame in the interval.
    pub worst_frame_ms: f32,
    pub active_moves: usize,
}

#[derive(Debug, Default)]
struct SharedMetrics {
    latest: RwLock<LoopMetricsSnapshot>,
    poison_reported: AtomicBool,
}

impl SharedMetrics {
    fn report_poison(&self, operation: &'static str) {
        if !self.poison_reported.swap(true, Ordering::Relaxed) {
            warn!(operation, "metrics_lock_poisoned");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LoopMetricsSnapshot> {
        self.latest.read().unwrap_or_else(|poisoned| {
            self.report_poison("read");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, LoopMetricsSnapshot> {
        self.latest.write().unwrap_or_else(|poisoned| {
            self.report_poison("write");
            poisoned.into_inner()
        })
    }
}

/// Latest loop metrics, readable from any thread. A poisoned lock still
/// yields the last value written.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    shared: Arc<SharedMetrics>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self.shared.read()
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self.shared.write() = snapshot;
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval: Duration,
    window_start: Duration,
    frames: u32,
    busy: Duration,
    worst: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Duration) -> Self {
        Self {
            interval,
            window_start: now,
            frames: 0,
            busy: Duration::ZERO,
            worst: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.busy = self.busy.saturating_add(frame_dt);
        self.worst = self.worst.max(frame_dt);
    }

    /// Closes the window once `interval` has elapsed since it opened and
    /// starts the next one at `now`.
    pub(crate) fn maybe_snapshot(
        &mut self,
        now: Duration,
        active_moves: usize,
    ) -> Option<LoopMetricsSnapshot> {
        let window = now.saturating_sub(self.window_start);
        if window < self.interval {
            return None;
        }

        let frame_time_ms = match self.frames {
            0 => 0.0,
            frames => self.busy.as_secs_f32() * 1000.0 / frames as f32,
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / window.as_secs_f32().max(f32::EPSILON),
            frame_time_ms,
            worst_frame_ms: self.worst.as_secs_f32() * 1000.0,
            active_moves,
        };
        *self = Self::new(self.interval, now);
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn poison(handle: &MetricsHandle) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = handle.shared.latest.write().expect("write guard");
                    panic!("poison metrics lock");
                })
                .join();
        });
    }

    #[test]
    fn window_reports_average_and_worst_frame() {
        let start = Duration::from_secs(5);
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), start);
        for ms in [10, 30, 20, 20] {
            accumulator.record_frame(Duration::from_millis(ms));
        }

        let snapshot = accumulator
            .maybe_snapshot(start + Duration::from_secs(2), 3)
            .expect("window closed");
        assert!((snapshot.fps - 2.0).abs() < 0.01);
        assert!((snapshot.frame_time_ms - 20.0).abs() < 0.001);
        assert!((snapshot.worst_frame_ms - 30.0).abs() < 0.001);
        assert_eq!(snapshot.active_moves, 3);
    }

    #[test]
    fn window_stays_open_until_the_interval_passes() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), Duration::ZERO);
        accumulator.record_frame(Duration::from_millis(16));
        assert!(accumulator
            .maybe_snapshot(Duration::from_millis(999), 0)
            .is_none());
    }

    #[test]
    fn closing_a_window_resets_the_counters() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), Duration::ZERO);
        accumulator.record_frame(Duration::from_millis(40));
        assert!(accumulator
            .maybe_snapshot(Duration::from_secs(1), 0)
            .is_some());
        assert!(accumulator
            .maybe_snapshot(Duration::from_millis(1_500), 0)
            .is_none());

        let empty = accumulator
            .maybe_snapshot(Duration::from_secs(2), 0)
            .expect("second window");
        assert_eq!(empty, LoopMetricsSnapshot::default());
    }

    #[test]
    fn poisoned_handle_keeps_serving_and_accepting_snapshots() {
        let handle = MetricsHandle::default();
        poison(&handle);
        assert_eq!(handle.snapshot(), LoopMetricsSnapshot::default());

        let expected = LoopMetricsSnapshot {
            fps: 15.0,
            frame_time_ms: 11.0,
            worst_frame_ms: 19.0,
            active_moves: 2,
        };
        handle.clone().publish(expected);
        assert_eq!(handle.snapshot(), expected);
        assert!(handle.shared.poison_reported.load(Ordering::Relaxed));
    }
}
