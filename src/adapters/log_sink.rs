//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::{AppEvent, SkipReason};
use crate::app::ports::EventSink;
use crate::sensors::climate::ReadOutcome;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { record_count } => {
                info!("START | records={}", record_count);
            }
            AppEvent::RecordLogged(r) => {
                info!(
                    "RECORD | seq={} | {} | T={:.2}\u{00b0}C ({:.2}\u{00b0}F) | RH={:.2}% | motion={}",
                    r.sequence,
                    r.local_datetime,
                    r.temperature_c,
                    r.temperature_f(),
                    r.humidity_pct,
                    r.motion_detected,
                );
            }
            AppEvent::IntervalSkipped(SkipReason::TimeUnavailable) => {
                warn!("SKIP | wall clock not synchronised");
            }
            AppEvent::IntervalSkipped(SkipReason::Store(e)) => {
                warn!("SKIP | store: {}", e);
            }
            AppEvent::MotionDetected { timestamp } => match timestamp {
                Some(ts) => info!("MOTION | rising edge at {}", ts),
                None => info!("MOTION | rising edge (clock unsynced)"),
            },
            AppEvent::SensorDegraded(reading) => {
                if let ReadOutcome::Degraded {
                    temperature_invalid,
                    humidity_invalid,
                } = reading.outcome
                {
                    warn!(
                        "SENSOR | degraded | temp_invalid={} humidity_invalid={}",
                        temperature_invalid, humidity_invalid
                    );
                }
            }
            AppEvent::StoreCleared => {
                info!("STORE | cleared");
            }
        }
    }
}
