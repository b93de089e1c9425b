//! DHT22 / AM2302 temperature and humidity sensor driver.
//!
//! Single-wire protocol: the host pulls the line low for >1 ms, releases
//! it, and the sensor answers with an 80 µs low / 80 µs high preamble
//! followed by 40 bits.  Each bit is a ~50 µs low followed by a high pulse
//! of ~27 µs (0) or ~70 µs (1).  The frame is humidity (16 bit, ×10),
//! temperature (15 bit magnitude + sign bit, ×10) and an 8-bit checksum.
//!
//! A timed-out or corrupt frame is reported as NaN in both fields.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the GPIO with busy-wait timing.
//! On host/test: reads values injected through atomics.

use core::sync::atomic::AtomicU32;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

use crate::sensors::climate::RawClimate;

static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(0x41B8_0000); // 23.0
static SIM_HUMIDITY_BITS: AtomicU32 = AtomicU32::new(0x4220_0000); // 40.0

/// Inject the next simulated reading.  NaN simulates a bad frame.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate(temperature_c: f32, humidity_pct: f32) {
    SIM_TEMP_BITS.store(temperature_c.to_bits(), Ordering::Relaxed);
    SIM_HUMIDITY_BITS.store(humidity_pct.to_bits(), Ordering::Relaxed);
}

const INVALID: RawClimate = RawClimate {
    temperature_c: f32::NAN,
    humidity_pct: f32::NAN,
};

pub struct Dht22 {
    _gpio: i32,
}

impl Dht22 {
    pub fn new(gpio: i32) -> Self {
        Self { _gpio: gpio }
    }

    pub fn read(&mut self) -> RawClimate {
        match self.read_frame() {
            Some(frame) => decode_frame(&frame).unwrap_or(INVALID),
            None => {
                log::debug!("DHT22: no response");
                INVALID
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_frame(&mut self) -> Option<[u8; 5]> {
        use esp_idf_svc::sys::*;

        let pin = self._gpio;
        // SAFETY: the pin is owned by this driver; configured once in
        // hw_init and only touched from the main loop.
        unsafe {
            gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD);
            gpio_set_level(pin, 0);
            esp_rom_delay_us(1_200);
            gpio_set_level(pin, 1);
            esp_rom_delay_us(30);
        }

        // Response preamble: low, high, then low for the first bit.
        wait_for_level(pin, false, 100)?;
        wait_for_level(pin, true, 100)?;
        wait_for_level(pin, false, 100)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            wait_for_level(pin, true, 80)?;
            let high_us = wait_for_level(pin, false, 100)?;
            if high_us > 40 {
                frame[bit / 8] |= 1 << (7 - bit % 8);
            }
        }
        Some(frame)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_frame(&mut self) -> Option<[u8; 5]> {
        let t = f32::from_bits(SIM_TEMP_BITS.load(Ordering::Relaxed));
        let h = f32::from_bits(SIM_HUMIDITY_BITS.load(Ordering::Relaxed));
        if !t.is_finite() || !h.is_finite() {
            return None;
        }
        Some(encode_frame(t, h))
    }
}

/// Busy-wait until `pin` reads `level`.  Returns the microseconds spent
/// waiting, or `None` after `timeout_us`.
#[cfg(target_os = "espidf")]
fn wait_for_level(pin: i32, level: bool, timeout_us: i64) -> Option<u32> {
    use esp_idf_svc::sys::*;

    // SAFETY: read-only register access on an input-capable pin.
    let start = unsafe { esp_timer_get_time() };
    loop {
        let elapsed = unsafe { esp_timer_get_time() } - start;
        if (unsafe { gpio_get_level(pin) } != 0) == level {
            return Some(elapsed as u32);
        }
        if elapsed > timeout_us {
            return None;
        }
    }
}

/// Convert a raw 5-byte frame.  `None` on checksum mismatch.
pub fn decode_frame(frame: &[u8; 5]) -> Option<RawClimate> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return None;
    }
    let humidity = u16::from_be_bytes([frame[0], frame[1]]) as f32 / 10.0;
    let magnitude = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]) as f32 / 10.0;
    let temperature = if frame[2] & 0x80 != 0 { -magnitude } else { magnitude };
    Some(RawClimate {
        temperature_c: temperature,
        humidity_pct: humidity,
    })
}

#[cfg(not(target_os = "espidf"))]
fn encode_frame(temperature_c: f32, humidity_pct: f32) -> [u8; 5] {
    let h = (humidity_pct * 10.0).round() as u16;
    let t = (temperature_c.abs() * 10.0).round() as u16 & 0x7FFF;
    let [h0, h1] = h.to_be_bytes();
    let [mut t0, t1] = t.to_be_bytes();
    if temperature_c < 0.0 {
        t0 |= 0x80;
    }
    let sum = h0.wrapping_add(h1).wrapping_add(t0).wrapping_add(t1);
    [h0, h1, t0, t1, sum]
}
