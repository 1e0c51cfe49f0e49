use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

type TimerCallback<Ctx> = Box<dyn FnMut(&mut Ctx, Duration)>;

struct Timer<Ctx> {
    handle: TimerHandle,
    callback: TimerCallback<Ctx>,
}

/// Recurring per-frame callbacks, run in registration order.
pub struct TimerManager<Ctx> {
    timers: Vec<Timer<Ctx>>,
    next_handle: u64,
}

impl<Ctx> Default for TimerManager<Ctx> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_handle: 0,
        }
    }
}

impl<Ctx> fmt::Debug for TimerManager<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerManager")
            .field(
                "handles",
                &self.timers.iter().map(|timer| timer.handle).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<Ctx> TimerManager<Ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, callback: impl FnMut(&mut Ctx, Duration) + 'static) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.timers.push(Timer {
            handle,
            callback: Box::new(callback),
        });
        handle
    }

    pub fn remove(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.handle != handle);
        self.timers.len() != before
    }

    pub fn clear_all(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Invokes every registered callback once. Returns how many ran.
    pub fn run_frame(&mut self, ctx: &mut Ctx, now: Duration) -> usize {
        for timer in &mut self.timers {
            (timer.callback)(ctx, now);
        }
        self.timers.len()
    }
}
