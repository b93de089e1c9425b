//! Two-clock interval scheduler.
//!
//! Drives the logger's two logical timers from an explicit millisecond
//! clock, so tests can feed synthetic time.  The scheduler notifies a
//! [`SchedulerDelegate`] when a timer fires; the main loop implements the
//! delegate to push events into the event queue.
//!
//! ```text
//!   uptime_ms ──▶ IntervalScheduler::tick()
//!                   │
//!                   ├─ every motion_tick_ms ──▶ TimerKind::Motion
//!                   └─ every log_interval_ms ─▶ TimerKind::Log
//!                                                  │
//!                                                  ▼
//!                                         SchedulerDelegate
//! ```
//!
//! When both timers are due in the same call, `Motion` is delivered
//! first, so the sample taken at the interval boundary belongs to the
//! interval being closed.  A stalled loop fires each timer once, not once
//! per missed period.

use log::info;

use crate::app::ports::{SchedulerDelegate, TimerKind};

#[derive(Debug, Clone, Copy)]
struct Timer {
    period_ms: u64,
    last_fire_ms: u64,
}

impl Timer {
    fn new(period_ms: u32, now_ms: u64) -> Self {
        Self {
            period_ms: u64::from(period_ms.max(1)),
            last_fire_ms: now_ms,
        }
    }

    fn poll(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_fire_ms) >= self.period_ms {
            self.last_fire_ms = now_ms;
            true
        } else {
            false
        }
    }
}

pub struct IntervalScheduler {
    motion: Timer,
    log: Timer,
}

impl IntervalScheduler {
    /// Both timers start counting from `start_ms`.
    pub fn new(motion_tick_ms: u32, log_interval_ms: u32, start_ms: u64) -> Self {
        info!(
            "Scheduler: motion every {}ms, log every {}ms",
            motion_tick_ms, log_interval_ms
        );
        Self {
            motion: Timer::new(motion_tick_ms, start_ms),
            log: Timer::new(log_interval_ms, start_ms),
        }
    }

    /// Change the logging period.  The current interval keeps its start.
    pub fn set_log_interval(&mut self, log_interval_ms: u32) {
        self.log.period_ms = u64::from(log_interval_ms.max(1));
        info!("Scheduler: log interval now {}ms", log_interval_ms);
    }

    pub fn log_interval_ms(&self) -> u64 {
        self.log.period_ms
    }

    /// Call on every loop iteration.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) {
        if self.motion.poll(now_ms) {
            delegate.on_timer_fired(TimerKind::Motion);
        }
        if self.log.poll(now_ms) {
            delegate.on_timer_fired(TimerKind::Log);
        }
    }
}
