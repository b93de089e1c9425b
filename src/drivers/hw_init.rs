//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions and mounts the SPIFFS partition that holds
//! the record file, using raw ESP-IDF sys calls.  Called once from
//! `main()` before the event loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::app::ports::FsCapacity;

/// VFS mount point of the record partition.
pub const STORAGE_BASE_PATH: &str = "/spiffs";

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    StorageMountFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc)   => write!(f, "GPIO config failed (rc={})", rc),
            Self::StorageMountFailed(rc) => write!(f, "SPIFFS mount failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals(dht_gpio: i32, pir_gpio: i32) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before event loop; single-threaded.
    unsafe {
        init_pir_input(pir_gpio)?;
        init_dht_line(dht_gpio)?;
    }
    info!("hw_init: GPIO configured (DHT22={}, PIR={})", dht_gpio, pir_gpio);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(_dht_gpio: i32, _pir_gpio: i32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_pir_input(pin: i32) -> Result<(), HwInitError> {
    // HC-SR501 drives its output push-pull; a pulldown keeps an
    // unplugged sensor reading "no motion".
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_dht_line(pin: i32) -> Result<(), HwInitError> {
    // Single-wire bus: open drain, idle high through the pullup.
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    unsafe { gpio_set_level(pin, 1) };
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured input.
    unsafe { gpio_get_level(pin) != 0 }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    false
}

// ── SPIFFS ────────────────────────────────────────────────────

/// Mount the default SPIFFS partition at [`STORAGE_BASE_PATH`],
/// formatting it if it cannot be mounted.
#[cfg(target_os = "espidf")]
pub fn mount_storage() -> Result<(), HwInitError> {
    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: conf outlives the call; strings are 'static.
    let ret = unsafe { esp_vfs_spiffs_register(&conf) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::StorageMountFailed(ret));
    }
    match storage_capacity() {
        Some(c) => info!(
            "hw_init: SPIFFS mounted at {} ({} / {} bytes used)",
            STORAGE_BASE_PATH, c.used_bytes, c.total_bytes
        ),
        None => info!("hw_init: SPIFFS mounted at {}", STORAGE_BASE_PATH),
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn mount_storage() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): storage mount skipped");
    Ok(())
}

/// Total and used bytes of the mounted SPIFFS partition.
#[cfg(target_os = "espidf")]
pub fn storage_capacity() -> Option<FsCapacity> {
    let mut total: usize = 0;
    let mut used: usize = 0;
    // SAFETY: out-pointers are valid locals; null label = default partition.
    let ret = unsafe { esp_spiffs_info(core::ptr::null(), &mut total, &mut used) };
    (ret == ESP_OK as i32).then(|| FsCapacity {
        total_bytes: total as u64,
        used_bytes: used as u64,
    })
}

#[cfg(not(target_os = "espidf"))]
pub fn storage_capacity() -> Option<FsCapacity> {
    None
}
