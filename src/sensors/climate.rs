//! Temperature / humidity sampling with a single bounded retry.
//!
//! The DHT22 occasionally returns a corrupted frame, which the driver
//! reports as NaN.  [`SensorSampler::read`] makes one primary attempt and,
//! if either field is not a finite number, exactly one retry after a short
//! fixed delay.  Fields still invalid after the retry are replaced by
//! [`SENTINEL`], and the [`ReadOutcome`] records that this happened so a
//! sentinel 0.0 can be told apart from a real 0.0.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::app::ports::ClimatePort;

/// Value stored in place of a field that could not be read.
pub const SENTINEL: f32 = 0.0;

/// Unvalidated values straight from the sensor driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawClimate {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl RawClimate {
    pub fn is_valid(&self) -> bool {
        self.temperature_c.is_finite() && self.humidity_pct.is_finite()
    }
}

/// Which attempt produced a [`Reading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The first read was valid.
    Primary,
    /// The first read was invalid, the retry was valid.
    Retried,
    /// Still invalid after the retry.  Flagged fields hold [`SENTINEL`].
    Degraded {
        temperature_invalid: bool,
        humidity_invalid: bool,
    },
}

/// A numerically well-formed sample.  Never contains NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub outcome: ReadOutcome,
}

impl Reading {
    /// `false` when any field is a sentinel substitute.
    pub fn is_valid(&self) -> bool {
        !matches!(self.outcome, ReadOutcome::Degraded { .. })
    }

    /// Derived on demand; Celsius is the only stored temperature.
    pub fn temperature_f(&self) -> f32 {
        celsius_to_fahrenheit(self.temperature_c)
    }
}

pub fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 9.0 / 5.0 + 32.0
}

pub struct SensorSampler {
    retry_delay_ms: u32,
    last: Option<Reading>,
}

impl SensorSampler {
    pub fn new(retry_delay_ms: u32) -> Self {
        Self {
            retry_delay_ms,
            last: None,
        }
    }

    /// Read the sensor, retrying once on an invalid value.
    ///
    /// `hw` supplies both the sensor and the retry delay, so a single
    /// hardware adapter can be passed without a double mutable borrow.
    /// Blocks for at most one `retry_delay_ms` plus two driver reads.
    pub fn read(&mut self, hw: &mut (impl ClimatePort + DelayNs)) -> Reading {
        let primary = hw.read_raw();
        let reading = if primary.is_valid() {
            Reading {
                temperature_c: primary.temperature_c,
                humidity_pct: primary.humidity_pct,
                outcome: ReadOutcome::Primary,
            }
        } else {
            debug!("Sampler: invalid read ({:?}), retrying in {}ms", primary, self.retry_delay_ms);
            hw.delay_ms(self.retry_delay_ms);
            let retry = hw.read_raw();
            if retry.is_valid() {
                Reading {
                    temperature_c: retry.temperature_c,
                    humidity_pct: retry.humidity_pct,
                    outcome: ReadOutcome::Retried,
                }
            } else {
                warn!("Sampler: sensor still invalid after retry ({:?})", retry);
                degrade(retry)
            }
        };
        self.last = Some(reading);
        reading
    }

    /// Most recent reading, for the live view.
    pub fn last_reading(&self) -> Option<Reading> {
        self.last
    }

    pub fn set_retry_delay(&mut self, retry_delay_ms: u32) {
        self.retry_delay_ms = retry_delay_ms;
    }
}

fn degrade(raw: RawClimate) -> Reading {
    let temperature_invalid = !raw.temperature_c.is_finite();
    let humidity_invalid = !raw.humidity_pct.is_finite();
    Reading {
        temperature_c: if temperature_invalid { SENTINEL } else { raw.temperature_c },
        humidity_pct: if humidity_invalid { SENTINEL } else { raw.humidity_pct },
        outcome: ReadOutcome::Degraded {
            temperature_invalid,
            humidity_invalid,
        },
    }
}
