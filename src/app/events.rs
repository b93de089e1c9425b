//! Outbound application events.
//!
//! The [`LoggerService`](super::service::LoggerService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.

use crate::error::StoreError;
use crate::sensors::climate::Reading;
use crate::store::Record;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service started; carries the recovered record count.
    Started { record_count: u32 },

    /// A record was persisted.
    RecordLogged(Record),

    /// A logging interval produced no record.
    IntervalSkipped(SkipReason),

    /// A rising edge on the motion input.
    MotionDetected { timestamp: Option<i64> },

    /// The sensor stayed invalid after the retry; sentinels were stored.
    SensorDegraded(Reading),

    /// The record store was wiped by request.
    StoreCleared,
}

/// Why an interval was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Wall clock not yet synchronised.
    TimeUnavailable,
    /// The store rejected the append.
    Store(StoreError),
}
