//! HC-SR501 passive infrared motion detector.
//!
//! The module drives its output HIGH for its configured hold time after
//! detecting motion.  It is read as a plain GPIO level; edge detection
//! happens in [`MotionAggregator`](crate::sensors::motion::MotionAggregator).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the GPIO level via hw_init helpers.
//! On host/test: reads an injected atomic (defaults to no motion).

use core::sync::atomic::AtomicBool;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

static SIM_PIR_LEVEL: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_motion(high: bool) {
    SIM_PIR_LEVEL.store(high, Ordering::Relaxed);
}

pub struct PirSensor {
    _gpio: i32,
}

impl PirSensor {
    pub fn new(gpio: i32) -> Self {
        Self { _gpio: gpio }
    }

    #[cfg(target_os = "espidf")]
    pub fn is_high(&self) -> bool {
        crate::drivers::hw_init::gpio_read(self._gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn is_high(&self) -> bool {
        SIM_PIR_LEVEL.load(Ordering::Relaxed)
    }
}
