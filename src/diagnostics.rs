//! Runtime diagnostics.
//!
//! Metrics (uptime, heap, RSSI, loop counters) are collected on demand
//! for the `/info` endpoint.  A custom panic hook logs the panic reason before the
//! ESP-IDF panic handler resets the chip.

use serde::Serialize;

/// Runtime diagnostics snapshot collected on-demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeMetrics {
    pub uptime_secs: u64,
    pub heap_free_bytes: u32,
    pub heap_min_free_bytes: u32,
    /// `None` while the station is not associated.
    pub wifi_rssi: Option<i8>,
    /// Control-loop iterations (watchdog feeds) since boot.
    pub loop_iterations: u32,
    pub requests_served: u32,
}

impl RuntimeMetrics {
    #[cfg(target_os = "espidf")]
    pub fn collect(uptime_secs: u64) -> Self {
        use esp_idf_svc::sys::*;
        let heap_free_bytes = unsafe { esp_get_free_heap_size() };
        let heap_min_free_bytes = unsafe { esp_get_minimum_free_heap_size() };

        Self {
            uptime_secs,
            heap_free_bytes,
            heap_min_free_bytes,
            wifi_rssi: Self::read_wifi_rssi(),
            loop_iterations: 0,
            requests_served: 0,
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_wifi_rssi() -> Option<i8> {
        use esp_idf_svc::sys::*;
        let mut ap_info: wifi_ap_record_t = unsafe { core::mem::zeroed() };
        let ret = unsafe { esp_wifi_sta_get_ap_info(&mut ap_info) };
        (ret == ESP_OK as i32).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn collect(uptime_secs: u64) -> Self {
        // Synthetic values that exercise the same code paths as hardware.
        // Heap "decays" slightly over time to model fragmentation.
        let base_free: u32 = 245_760; // 240 KB
        let decay = ((uptime_secs / 60) as u32).saturating_mul(256);
        let heap_free_bytes = base_free.saturating_sub(decay);
        let heap_min_free_bytes = (heap_free_bytes as f32 * 0.85) as u32;

        Self {
            uptime_secs,
            heap_free_bytes,
            heap_min_free_bytes,
            wifi_rssi: Some(-60),
            loop_iterations: 0,
            requests_served: 0,
        }
    }

    /// Attach the control loop's liveness counters.
    pub fn with_loop_counters(self, loop_iterations: u32, requests_served: u32) -> Self {
        Self {
            loop_iterations,
            requests_served,
            ..self
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Custom panic handler
// ───────────────────────────────────────────────────────────────

/// Install a panic hook that logs the panic reason and location.
///
/// Call once during init, after the logger is up.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };

        match info.location() {
            Some(loc) => log::error!("PANIC: {} at {}:{}", reason, loc.file(), loc.line()),
            None => log::error!("PANIC: {}", reason),
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_heap_decays_with_uptime() {
        let fresh = RuntimeMetrics::collect(0);
        let aged = RuntimeMetrics::collect(3_600);
        assert_eq!(fresh.uptime_secs, 0);
        assert!(aged.heap_free_bytes < fresh.heap_free_bytes);
        assert!(aged.heap_min_free_bytes <= aged.heap_free_bytes);
    }

    #[test]
    fn sim_heap_never_underflows() {
        let ancient = RuntimeMetrics::collect(u64::from(u32::MAX));
        assert_eq!(ancient.heap_free_bytes, 0);
    }

    #[test]
    fn loop_counters_are_attached() {
        let m = RuntimeMetrics::collect(5).with_loop_counters(300, 2);
        assert_eq!(m.loop_iterations, 300);
        assert_eq!(m.requests_served, 2);
        assert_eq!(m.uptime_secs, 5);
    }
}
