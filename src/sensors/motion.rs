//! Edge-triggered motion aggregation.
//!
//! The PIR output is sampled once per fast tick.  Comparing each sample
//! with the previous one yields rising / falling edges; a rising edge
//! latches `any_motion` for the logging interval in flight.  The latch is
//! cleared only by [`MotionAggregator::flush`], which the service calls
//! right after the interval's record has been persisted.
//!
//! ```text
//!  raw pin   ___/‾‾‾‾\_____/‾‾\____
//!  edges        R    F     R  F
//!  any_motion   ‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾  (until flush)
//! ```

use core::mem;

/// Transition of the motion input between consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// An edge detected by [`MotionAggregator::sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionEvent {
    pub edge: Edge,
    /// Epoch seconds of a rising edge, if the wall clock was available.
    /// Always `None` for falling edges.
    pub timestamp: Option<i64>,
}

#[derive(Debug, Default)]
pub struct MotionAggregator {
    /// Level seen on the previous sample.  Starts low.
    previous: bool,
    /// At least one rising edge since the last flush.
    any_motion: bool,
    /// Survives flushes; only replaced by a newer timestamped rising edge.
    last_motion_at: Option<i64>,
}

impl MotionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw pin sample.
    ///
    /// `now` is only evaluated on a rising edge.  If it yields `None` the
    /// motion flag is still latched; only the timestamp update is skipped.
    pub fn sample(&mut self, raw: bool, now: impl FnOnce() -> Option<i64>) -> Option<MotionEvent> {
        let previous = mem::replace(&mut self.previous, raw);
        match (previous, raw) {
            (false, true) => {
                self.any_motion = true;
                let timestamp = now();
                if timestamp.is_some() {
                    self.last_motion_at = timestamp;
                }
                Some(MotionEvent {
                    edge: Edge::Rising,
                    timestamp,
                })
            }
            (true, false) => Some(MotionEvent {
                edge: Edge::Falling,
                timestamp: None,
            }),
            _ => None,
        }
    }

    /// Return the interval's aggregate and reset it.
    pub fn flush(&mut self) -> bool {
        mem::take(&mut self.any_motion)
    }

    /// Current aggregate without consuming it.
    pub fn any_motion(&self) -> bool {
        self.any_motion
    }

    /// Instantaneous level from the most recent sample.
    pub fn is_active(&self) -> bool {
        self.previous
    }

    pub fn last_motion_at(&self) -> Option<i64> {
        self.last_motion_at
    }
}
