//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LoggerService (domain)
//! ```
//!
//! Driven adapters (sensors, clock, record file, event sinks, config
//! storage) implement these traits.  The
//! [`LoggerService`](super::service::LoggerService) consumes them via
//! generics, so the domain core never touches hardware directly.

use chrono::{DateTime, FixedOffset};

use crate::config::LoggerConfig;
use crate::error::StoreError;
use crate::sensors::climate::RawClimate;

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapters: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Temperature / humidity source.
///
/// A failed read is reported in-band as NaN in either field; the
/// [`SensorSampler`](crate::sensors::climate::SensorSampler) decides
/// whether to retry or substitute.
pub trait ClimatePort {
    fn read_raw(&mut self) -> RawClimate;
}

/// Raw motion detector level, sampled once per fast tick.
pub trait MotionPort {
    /// `true` while the detector output is high.
    fn motion_level(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic and wall-clock time.
pub trait TimePort {
    /// Milliseconds since boot.  Drives the scheduler.
    fn uptime_ms(&self) -> u64;

    /// Local wall-clock time, or `None` before the clock is synchronised.
    fn now(&self) -> Option<DateTime<FixedOffset>>;
}

// ───────────────────────────────────────────────────────────────
// Record file port (driven adapter: domain ↔ flash filesystem)
// ───────────────────────────────────────────────────────────────

/// Filesystem capacity, for the `/info` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsCapacity {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

/// A single append-only text file.
///
/// The [`RecordStore`](crate::store::RecordStore) owns the schema and
/// the sequence counter; implementations only move bytes.
pub trait FileStore {
    /// Whether the backing file currently exists.
    fn exists(&self) -> bool;

    /// Create (or truncate) the file with `contents` as its first write.
    fn create(&mut self, contents: &str) -> Result<(), StoreError>;

    /// Append `line` to the end of an existing file.
    ///
    /// Fails with [`StoreError::OpenFailed`] if the file cannot be opened
    /// for writing; nothing is written in that case.
    fn append(&mut self, line: &str) -> Result<(), StoreError>;

    /// Whole file content.
    fn read_to_string(&self) -> Result<String, StoreError>;

    /// Delete the file.  Deleting a missing file is not an error.
    fn remove(&mut self) -> Result<(), StoreError>;

    /// File size in bytes (0 if missing).
    fn size(&self) -> u64;

    /// Capacity of the filesystem holding the file, if known.
    fn capacity(&self) -> Option<FsCapacity>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST call [`LoggerConfig::validate`] before
/// persisting and reject invalid values rather than clamp them.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`LoggerConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<LoggerConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &LoggerConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from event system)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the [`IntervalScheduler`](crate::scheduler::IntervalScheduler)
/// invokes when one of its timers fires.
pub trait SchedulerDelegate {
    fn on_timer_fired(&mut self, kind: TimerKind);
}

/// Which logical timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fast tick: sample the motion pin.
    Motion,
    /// Slow tick: read the climate sensor and append a record.
    Log,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
