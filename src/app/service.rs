//! Application service: the hexagonal core.
//!
//! [`LoggerService`] owns the motion aggregate, the sensor sampler and the
//! record store.  It exposes a hardware-agnostic API; all I/O flows
//! through port traits injected at call sites, so the entire service is
//! testable with mock adapters.
//!
//! ```text
//!   MotionPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  ClimatePort ──▶ │      LoggerService        │
//!     TimePort ──▶ │ Motion · Sampler · Store  │ ──▶ FileStore
//!                  └──────────────────────────┘
//! ```
//!
//! The motion aggregate is consumed only by a successful append.  An
//! interval that is skipped (clock not set, store unwritable) leaves it
//! latched, so the motion is reported by the next record that does get
//! written.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::LoggerConfig;
use crate::error::{Error, StoreError};
use crate::sensors::climate::{Reading, SensorSampler};
use crate::sensors::motion::{Edge, MotionAggregator};
use crate::store::{projector, Record, RecordStore, StoreStats};

use super::commands::AppCommand;
use super::events::{AppEvent, SkipReason};
use super::ports::{ClimatePort, EventSink, FileStore, FsCapacity, MotionPort, TimePort};

/// Snapshot for the live view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveStatus {
    /// Most recent sensor reading, persisted or not.
    pub reading: Option<Reading>,
    /// Motion input level right now.
    pub motion_active: bool,
    /// Motion seen since the last persisted record.
    pub motion_this_interval: bool,
    /// Epoch seconds of the most recent timestamped rising edge.
    pub last_motion_at: Option<i64>,
    pub record_count: u32,
    pub skipped_intervals: u32,
    pub log_interval_ms: u32,
}

pub struct LoggerService<F: FileStore> {
    config: LoggerConfig,
    motion: MotionAggregator,
    sampler: SensorSampler,
    store: RecordStore<F>,
    skipped_intervals: u32,
}

impl<F: FileStore> LoggerService<F> {
    /// Build the service and open the record store on `file`.
    pub fn new(config: LoggerConfig, file: F) -> Self {
        let sampler = SensorSampler::new(config.sensor_retry_delay_ms);
        Self {
            motion: MotionAggregator::new(),
            sampler,
            store: RecordStore::open(file),
            config,
            skipped_intervals: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        let record_count = self.store.last_sequence();
        sink.emit(&AppEvent::Started { record_count });
        info!(
            "LoggerService started: {} records, interval {}ms",
            record_count, self.config.log_interval_ms
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Fast tick: sample the motion input once.
    pub fn sample_motion(
        &mut self,
        hw: &mut impl MotionPort,
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) {
        let level = hw.motion_level();
        let event = self
            .motion
            .sample(level, || clock.now().map(|t| t.timestamp()));
        if let Some(ev) = event {
            if ev.edge == Edge::Rising {
                sink.emit(&AppEvent::MotionDetected {
                    timestamp: ev.timestamp,
                });
            }
        }
    }

    /// Slow tick: read the climate sensor and append one record.
    ///
    /// Returns the persisted record, or `None` if the interval was
    /// skipped.  The sensor is read either way so the live view stays
    /// current.
    pub fn log_interval(
        &mut self,
        hw: &mut (impl ClimatePort + DelayNs),
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> Option<Record> {
        let reading = self.sampler.read(hw);
        if !reading.is_valid() {
            sink.emit(&AppEvent::SensorDegraded(reading));
        }

        let Some(now) = clock.now() else {
            warn!("Interval skipped: wall clock not synchronised");
            self.skip(SkipReason::TimeUnavailable, sink);
            return None;
        };

        match self.store.append(&reading, self.motion.any_motion(), &now) {
            Ok(record) => {
                self.motion.flush();
                sink.emit(&AppEvent::RecordLogged(record.clone()));
                Some(record)
            }
            Err(e) => {
                self.skip(SkipReason::Store(e), sink);
                None
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (HTTP gateway, serial console).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        match cmd {
            AppCommand::ClearStore => self.clear_store(sink).map_err(Error::from),
            AppCommand::UpdateConfig(new_config) => {
                new_config.validate().map_err(|_| Error::Config("rejected update"))?;
                self.sampler.set_retry_delay(new_config.sensor_retry_delay_ms);
                self.config = new_config;
                info!("Configuration updated at runtime");
                Ok(())
            }
        }
    }

    /// Delete every record.  The next record gets sequence 1.
    pub fn clear_store(&mut self, sink: &mut impl EventSink) -> Result<(), StoreError> {
        self.store.reset()?;
        sink.emit(&AppEvent::StoreCleared);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn live_status(&self) -> LiveStatus {
        LiveStatus {
            reading: self.sampler.last_reading(),
            motion_active: self.motion.is_active(),
            motion_this_interval: self.motion.any_motion(),
            last_motion_at: self.motion.last_motion_at(),
            record_count: self.store.last_sequence(),
            skipped_intervals: self.skipped_intervals,
            log_interval_ms: self.config.log_interval_ms,
        }
    }

    /// Raw store bytes, header included.
    pub fn export_csv(&mut self) -> Result<String, StoreError> {
        self.store.read_all()
    }

    /// `{"data":[...]}` projection of the store.
    pub fn export_json(&mut self) -> Result<String, Error> {
        let raw = self.store.read_all()?;
        projector::to_json(&raw).map_err(|e| {
            warn!("JSON projection failed: {}", e);
            Error::Encode
        })
    }

    pub fn store_stats(&self) -> StoreStats {
        self.store.stats()
    }

    pub fn capacity(&self) -> Option<FsCapacity> {
        self.store.capacity()
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn store(&self) -> &RecordStore<F> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RecordStore<F> {
        &mut self.store
    }

    // ── Internal ──────────────────────────────────────────────

    fn skip(&mut self, reason: SkipReason, sink: &mut impl EventSink) {
        self.skipped_intervals = self.skipped_intervals.saturating_add(1);
        sink.emit(&AppEvent::IntervalSkipped(reason));
    }
}
