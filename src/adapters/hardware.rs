//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the DHT22 and PIR drivers and exposes them through
//! [`ClimatePort`] and [`MotionPort`], plus the blocking delay the
//! sampler waits on before its retry.  This is the only module in the
//! system that touches sensor hardware.  On non-espidf targets the
//! drivers use cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{ClimatePort, MotionPort};
use crate::sensors::climate::RawClimate;
use crate::sensors::dht22::Dht22;
use crate::sensors::pir::PirSensor;

/// Concrete adapter that combines all sensor hardware behind port traits.
pub struct HardwareAdapter {
    dht: Dht22,
    pir: PirSensor,
    #[cfg(target_os = "espidf")]
    delay: esp_idf_hal::delay::Delay,
}

impl HardwareAdapter {
    pub fn new(dht: Dht22, pir: PirSensor) -> Self {
        Self {
            dht,
            pir,
            #[cfg(target_os = "espidf")]
            delay: esp_idf_hal::delay::Delay::new_default(),
        }
    }
}

// ── Sensor ports ──────────────────────────────────────────────

impl ClimatePort for HardwareAdapter {
    fn read_raw(&mut self) -> RawClimate {
        self.dht.read()
    }
}

impl MotionPort for HardwareAdapter {
    fn motion_level(&mut self) -> bool {
        self.pir.is_high()
    }
}

// ── Retry delay ───────────────────────────────────────────────

impl DelayNs for HardwareAdapter {
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}
