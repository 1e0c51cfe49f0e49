use std::time::Duration;

use tracing::{debug, info};

use crate::state::GameAction;

use super::clock::Clock;
use super::engine::Engine;
use super::metrics::{MetricsAccumulator, MetricsHandle};
use super::timers::{TimerHandle, TimerManager};

/// Drives an [`Engine`] from a [`Clock`]. Hosts call [`FrameLoop::pump_frame`]
/// once per display frame between [`FrameLoop::start`] and [`FrameLoop::stop`].
#[derive(Debug)]
pub struct FrameLoop<C: Clock> {
    clock: C,
    engine: Engine,
    timers: TimerManager<Engine>,
    metrics: MetricsHandle,
    accumulator: Option<MetricsAccumulator>,
    last_frame: Option<Duration>,
    frames: u64,
}

impl<C: Clock> FrameLoop<C> {
    pub fn new(engine: Engine, clock: C) -> Self {
        Self::with_metrics(engine, clock, MetricsHandle::default())
    }

    pub fn with_metrics(engine: Engine, clock: C, metrics: MetricsHandle) -> Self {
        Self {
            clock,
            engine,
            timers: TimerManager::new(),
            metrics,
            accumulator: None,
            last_frame: None,
            frames: 0,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn metrics_handle(&self) -> MetricsHandle {
        self.metrics.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn frames_pumped(&self) -> u64 {
        self.frames
    }

    /// Registers the simulation tick and the effects tick. Restarting a running
    /// loop replaces its timers.
    pub fn start(&mut self) -> [TimerHandle; 2] {
        if self.is_running() {
            self.timers.clear_all();
        }
        let now = self.clock.now();
        let tick = self.timers.add(|engine: &mut Engine, now| {
            engine.tick(now);
        });

        let effects_interval = non_zero_or(
            self.engine.config().effects_interval,
            Duration::from_millis(250),
        );
        let mut last_effect = now;
        let effects = self.timers.add(move |engine: &mut Engine, now| {
            if now.saturating_sub(last_effect) >= effects_interval {
                engine.dispatch(GameAction::EffectTick);
                last_effect = now;
            }
        });

        let metrics_interval =
            non_zero_or(self.engine.config().metrics_interval, Duration::from_secs(1));
        self.accumulator = Some(MetricsAccumulator::new(metrics_interval, now));
        self.last_frame = Some(now);
        info!(
            effects_interval_ms = effects_interval.as_millis() as u64,
            metrics_interval_ms = metrics_interval.as_millis() as u64,
            "frame_loop_started"
        );
        [tick, effects]
    }

    /// Runs one frame at the clock's current time. Returns whether any timer ran;
    /// a stopped loop touches nothing.
    pub fn pump_frame(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let now = self.clock.now();
        self.timers.run_frame(&mut self.engine, now);
        self.frames = self.frames.saturating_add(1);

        let frame_dt = self
            .last_frame
            .map(|last| now.saturating_sub(last))
            .unwrap_or(Duration::ZERO);
        self.last_frame = Some(now);
        if let Some(accumulator) = self.accumulator.as_mut() {
            accumulator.record_frame(frame_dt);
            let active_moves = self.engine.movement().active_move_count();
            if let Some(snapshot) = accumulator.maybe_snapshot(now, active_moves) {
                self.metrics.publish(snapshot);
                info!(
                    fps = snapshot.fps,
                    frame_time_ms = snapshot.frame_time_ms,
                    worst_frame_ms = snapshot.worst_frame_ms,
                    active_moves = snapshot.active_moves,
                    "loop_metrics"
                );
            }
        }
        true
    }

    /// Tears down every timer. Pumping afterwards is a no-op until the next
    /// [`FrameLoop::start`].
    pub fn stop(&mut self) {
        let removed = self.timers.len();
        self.timers.clear_all();
        self.accumulator = None;
        self.last_frame = None;
        debug!(removed, frames = self.frames, "frame_loop_stopped");
    }
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

/// Frame budget for a render rate cap; `None` or zero means uncapped.
pub fn target_frame_duration(max_fps: Option<u32>) -> Option<Duration> {
    max_fps
        .filter(|fps| *fps > 0)
        .map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

/// How long a host should sleep after a frame that took `elapsed`.
pub fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}
