//! System configuration parameters
//!
//! All tunable parameters for the RoomLogger.  Values can be overridden
//! via NVS (see [`NvsAdapter`](crate::adapters::nvs::NvsAdapter)).
//! Only `log_interval_ms` changes what the core records; everything else
//! is wiring.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins;

/// Shortest logging interval that is accepted at all.
pub const MIN_LOG_INTERVAL_MS: u32 = 1_000;
/// Shortest logging interval the DHT22 is comfortable with.
pub const RECOMMENDED_MIN_LOG_INTERVAL_MS: u32 = 5_000;
const MAX_LOG_INTERVAL_MS: u32 = 3_600_000;
const MAX_TZ_OFFSET_SECS: i32 = 14 * 3600;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    // --- Pins ---
    /// DHT22 data GPIO
    pub dht_gpio: i32,
    /// PIR output GPIO
    pub pir_gpio: i32,

    // --- Timing ---
    /// Interval between persisted records (milliseconds)
    pub log_interval_ms: u32,
    /// Motion pin sampling period (milliseconds)
    pub motion_tick_ms: u32,
    /// Pause before the single sensor retry (milliseconds)
    pub sensor_retry_delay_ms: u32,

    // --- Clock ---
    /// Local timezone offset from UTC (seconds)
    pub tz_offset_secs: i32,
    pub ntp_server: heapless::String<64>,

    // --- Network ---
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
    pub http_port: u16,

    // --- Storage ---
    /// Path of the CSV record file
    pub store_path: heapless::String<64>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            // Pins
            dht_gpio: pins::DHT_GPIO,
            pir_gpio: pins::PIR_GPIO,

            // Timing
            log_interval_ms: 10_000,    // one record every 10 s
            motion_tick_ms: 50,         // 20 Hz
            sensor_retry_delay_ms: 100,

            // Clock
            tz_offset_secs: 0,
            ntp_server: fixed_str("pool.ntp.org"),

            // Network
            wifi_ssid: heapless::String::new(),
            wifi_password: heapless::String::new(),
            http_port: 80,

            // Storage
            store_path: fixed_str("/spiffs/sensor_data.csv"),
        }
    }
}

impl LoggerConfig {
    /// Range-check every field.  Out-of-range values are rejected, not
    /// clamped.  A logging interval under the recommended minimum is
    /// accepted but logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_LOG_INTERVAL_MS..=MAX_LOG_INTERVAL_MS).contains(&self.log_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "log_interval_ms must be 1000–3600000",
            ));
        }
        if self.motion_tick_ms == 0 || self.motion_tick_ms >= self.log_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "motion_tick_ms must be > 0 and < log_interval_ms",
            ));
        }
        if self.sensor_retry_delay_ms > 1_000 {
            return Err(ConfigError::ValidationFailed(
                "sensor_retry_delay_ms must be 0–1000",
            ));
        }
        if self.tz_offset_secs.abs() > MAX_TZ_OFFSET_SECS {
            return Err(ConfigError::ValidationFailed(
                "tz_offset_secs must be within ±14h",
            ));
        }
        if self.store_path.is_empty() {
            return Err(ConfigError::ValidationFailed("store_path must not be empty"));
        }
        if self.log_interval_ms < RECOMMENDED_MIN_LOG_INTERVAL_MS {
            warn!(
                "Config: log interval {}ms is below the recommended {}ms",
                self.log_interval_ms, RECOMMENDED_MIN_LOG_INTERVAL_MS
            );
        }
        Ok(())
    }
}

/// Copy `s` into a fixed-capacity string, truncating on overflow.
pub(crate) fn fixed_str<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
