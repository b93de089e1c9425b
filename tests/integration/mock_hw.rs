//! Mock adapters for integration tests.
//!
//! Scripted sensors, a settable clock and a sink that records every
//! event, so tests can assert on the full history without touching GPIO.

use std::cell::Cell;
use std::collections::VecDeque;

use chrono::{DateTime, FixedOffset, TimeZone};
use embedded_hal::delay::DelayNs;

use roomlogger::app::events::AppEvent;
use roomlogger::app::ports::{ClimatePort, EventSink, MotionPort, TimePort};
use roomlogger::sensors::climate::RawClimate;

// ── MockHardware ──────────────────────────────────────────────

/// Climate reads are served from a script; once it runs out the last
/// fallback value repeats.  The motion level is set directly.
pub struct MockHardware {
    script: VecDeque<RawClimate>,
    pub fallback: RawClimate,
    pub motion: bool,
    pub climate_reads: u32,
    pub delayed_ns: u64,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: RawClimate {
                temperature_c,
                humidity_pct,
            },
            motion: false,
            climate_reads: 0,
            delayed_ns: 0,
        }
    }

    /// Queue raw readings served before the fallback.
    pub fn queue(&mut self, temperature_c: f32, humidity_pct: f32) {
        self.script.push_back(RawClimate {
            temperature_c,
            humidity_pct,
        });
    }
}

impl ClimatePort for MockHardware {
    fn read_raw(&mut self) -> RawClimate {
        self.climate_reads += 1;
        self.script.pop_front().unwrap_or(self.fallback)
    }
}

impl MotionPort for MockHardware {
    fn motion_level(&mut self) -> bool {
        self.motion
    }
}

impl DelayNs for MockHardware {
    fn delay_ns(&mut self, ns: u32) {
        self.delayed_ns += u64::from(ns);
    }
}

// ── MockClock ─────────────────────────────────────────────────

pub struct MockClock {
    pub wall: Cell<Option<DateTime<FixedOffset>>>,
    pub uptime_ms: Cell<u64>,
}

#[allow(dead_code)]
impl MockClock {
    /// Synchronised at 2025-08-11 12:00:00 UTC (epoch 1754913600).
    pub fn synced() -> Self {
        Self {
            wall: Cell::new(Some(noon_utc())),
            uptime_ms: Cell::new(0),
        }
    }

    pub fn unsynced() -> Self {
        Self {
            wall: Cell::new(None),
            uptime_ms: Cell::new(0),
        }
    }

    /// Move both clocks forward.
    pub fn advance_ms(&self, ms: u64) {
        self.uptime_ms.set(self.uptime_ms.get() + ms);
        if let Some(t) = self.wall.get() {
            self.wall
                .set(Some(t + chrono::Duration::milliseconds(ms as i64)));
        }
    }
}

impl TimePort for MockClock {
    fn uptime_ms(&self) -> u64 {
        self.uptime_ms.get()
    }

    fn now(&self) -> Option<DateTime<FixedOffset>> {
        self.wall.get()
    }
}

pub fn noon_utc() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2025, 8, 11, 12, 0, 0)
        .unwrap()
}

// ── CollectingSink ────────────────────────────────────────────

#[derive(Default)]
pub struct CollectingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(*e)).count()
    }
}

impl EventSink for CollectingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
