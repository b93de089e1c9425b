//! ESP32 time adapter.
//!
//! Implements [`TimePort`]: monotonic uptime for the scheduler and the
//! local wall clock for record timestamps.
//!
//! - **`target_os = "espidf"`**: uptime from `esp_timer_get_time()`;
//!   wall clock from `gettimeofday()`, set by SNTP once the station is up.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and
//!   `SystemTime`; the wall clock can be forced unavailable to exercise
//!   the skip path.
//!
//! Any epoch before 2020-01-01 means the clock was never set.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use log::warn;

use crate::app::ports::TimePort;

/// 2020-01-01T00:00:00Z.  Earlier readings are treated as unsynchronised.
pub const EPOCH_2020: i64 = 1_577_836_800;

/// Apply `offset` to a UTC epoch, rejecting unsynchronised values.
pub fn local_from_epoch(epoch_secs: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    if epoch_secs < EPOCH_2020 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(epoch_secs, 0).map(|utc| utc.with_timezone(&offset))
}

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    offset: FixedOffset,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(not(target_os = "espidf"))]
    wall_clock_available: bool,
    #[cfg(target_os = "espidf")]
    sntp: Option<esp_idf_svc::sntp::EspSntp<'static>>,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Esp32TimeAdapter {
    /// `tz_offset_secs` east of UTC.  Out-of-range offsets fall back to UTC.
    pub fn new(tz_offset_secs: i32) -> Self {
        let offset = FixedOffset::east_opt(tz_offset_secs).unwrap_or_else(|| {
            warn!("Time: invalid tz offset {}s, using UTC", tz_offset_secs);
            Utc.fix()
        });
        Self {
            offset,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(not(target_os = "espidf"))]
            wall_clock_available: true,
            #[cfg(target_os = "espidf")]
            sntp: None,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Seconds since boot (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.uptime_ms() / 1000
    }

    /// Start SNTP against `server`.  Call once the network is up.
    #[cfg(target_os = "espidf")]
    pub fn start_sntp(&mut self, server: &str) -> Result<(), esp_idf_svc::sys::EspError> {
        use esp_idf_svc::sntp::{EspSntp, SntpConf};

        if self.sntp.is_some() {
            return Ok(());
        }
        let mut conf = SntpConf::default();
        // The server name must outlive the SNTP service.
        let server: &'static str = Box::leak(server.to_owned().into_boxed_str());
        conf.servers[0] = server;
        self.sntp = Some(EspSntp::new(&conf)?);
        log::info!("Time: SNTP started against {}", server);
        Ok(())
    }

    /// Whether the wall clock has been set.
    pub fn is_synced(&self) -> bool {
        self.now().is_some()
    }

    /// Simulation: make the wall clock report unsynchronised.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_wall_clock_available(&mut self, available: bool) {
        self.wall_clock_available = available;
    }

    #[cfg(target_os = "espidf")]
    fn epoch_secs(&self) -> Option<i64> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        Some(tv.tv_sec as i64)
    }

    #[cfg(not(target_os = "espidf"))]
    fn epoch_secs(&self) -> Option<i64> {
        if !self.wall_clock_available {
            return None;
        }
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs() as i64)
    }
}

impl TimePort for Esp32TimeAdapter {
    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn now(&self) -> Option<DateTime<FixedOffset>> {
        self.epoch_secs()
            .and_then(|secs| local_from_epoch(secs, self.offset))
    }
}
