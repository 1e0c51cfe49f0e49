mod clock;
mod engine;
mod frame_loop;
mod input;
mod metrics;
mod timers;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Engine, EngineConfig, FrameView};
pub use frame_loop::{compute_cap_sleep, target_frame_duration, FrameLoop};
pub use input::{CommandOutcome, EngineCommand};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use timers::{TimerHandle, TimerManager};
