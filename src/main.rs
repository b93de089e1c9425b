//! RoomLogger firmware entry point.
//!
//! Hexagonal architecture with a single-threaded, event-driven loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Esp32Time       │
//! │  (Climate+Motion)  (EventSink)    (Config)     (TimePort)      │
//! │  FsFileStore       WifiAdapter    HttpServer                   │
//! │  (FileStore)       (Connectivity) (query gateway)              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            LoggerService (pure logic)                  │    │
//! │  │  MotionAggregator · SensorSampler · RecordStore        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  IntervalScheduler (delegate-driven) · lock-free event queue   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use roomlogger::adapters::fs_store::FsFileStore;
use roomlogger::adapters::hardware::HardwareAdapter;
use roomlogger::adapters::http::HttpServer;
use roomlogger::adapters::log_sink::LogEventSink;
use roomlogger::adapters::nvs::NvsAdapter;
use roomlogger::adapters::time::Esp32TimeAdapter;
use roomlogger::adapters::wifi::{ConnectivityPort, WifiAdapter};
use roomlogger::app::ports::{ConfigPort, SchedulerDelegate, TimePort, TimerKind};
use roomlogger::app::service::LoggerService;
use roomlogger::config::LoggerConfig;
use roomlogger::diagnostics::{self, RuntimeMetrics};
use roomlogger::drivers::{hw_init, watchdog::Watchdog};
use roomlogger::events::{self, push_event, Event};
use roomlogger::gateway;
use roomlogger::scheduler::IntervalScheduler;
use roomlogger::sensors::{dht22::Dht22, pir::PirSensor};

/// Main loop idle time per iteration.
const LOOP_IDLE_MS: u32 = 10;

// ── Scheduler delegate ────────────────────────────────────────
//
// Bridges the scheduler (which knows nothing about the event system)
// to the event queue.

struct EventQueueDelegate;

impl SchedulerDelegate for EventQueueDelegate {
    fn on_timer_fired(&mut self, kind: TimerKind) {
        let event = match kind {
            TimerKind::Motion => Event::MotionTick,
            TimerKind::Log => Event::LogTick,
        };
        if !push_event(event) {
            warn!("Event queue full, dropped {:?}", event);
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  RoomLogger v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    diagnostics::install_panic_handler();

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new() {
        Ok(nvs) => nvs.load().unwrap_or_else(|e| {
            warn!("NVS config load failed ({}), using defaults", e);
            LoggerConfig::default()
        }),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            LoggerConfig::default()
        }
    };

    // ── 3. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals(config.dht_gpio, config.pir_gpio) {
        // Critical: halt and let the watchdog reset the chip.
        error!("GPIO init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    if let Err(e) = hw_init::mount_storage() {
        // The store reports every failed append; keep sampling so the
        // live view still works.
        error!("Storage mount failed: {}", e);
    }
    let mut watchdog = Watchdog::new();

    // ── 4. Construct adapters and the service ─────────────────
    let mut hw = HardwareAdapter::new(Dht22::new(config.dht_gpio), PirSensor::new(config.pir_gpio));
    let mut log_sink = LogEventSink::new();
    let mut clock = Esp32TimeAdapter::new(config.tz_offset_secs);

    let mut service = LoggerService::new(
        config.clone(),
        FsFileStore::new(config.store_path.as_str()),
    );
    service.start(&mut log_sink);

    // ── 5. WiFi station ───────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sys_loop.clone(), None)?;
    let mut wifi = WifiAdapter::new();
    wifi.attach(BlockingWifi::wrap(esp_wifi, sys_loop)?);

    match wifi.set_credentials(config.wifi_ssid.as_str(), config.wifi_password.as_str()) {
        Ok(()) => {
            if let Err(e) = wifi.connect() {
                warn!("WiFi: initial connect failed ({}), will retry", e);
            }
        }
        Err(e) => warn!("WiFi: no usable credentials ({}), offline mode", e),
    }
    let mut network_up = false;

    // ── 6. Query gateway ──────────────────────────────────────
    let mut server = match HttpServer::bind(config.http_port) {
        Ok(s) => Some(s),
        Err(e) => {
            error!("HTTP: {}", e);
            None
        }
    };

    // ── 7. Scheduler ──────────────────────────────────────────
    let mut sched = IntervalScheduler::new(
        config.motion_tick_ms,
        config.log_interval_ms,
        clock.uptime_ms(),
    );
    let mut sched_delegate = EventQueueDelegate;

    info!("System ready. Entering event loop.");

    // ── 8. Event loop ─────────────────────────────────────────
    loop {
        let now_ms = clock.uptime_ms();
        sched.tick(now_ms, &mut sched_delegate);

        // Connectivity edges become events so they are handled in order
        // with the sampling ticks.
        let connected = wifi.is_connected();
        if connected != network_up {
            network_up = connected;
            push_event(if connected { Event::NetworkUp } else { Event::NetworkDown });
        }

        events::drain_events(|event| match event {
            Event::MotionTick => {
                service.sample_motion(&mut hw, &clock, &mut log_sink);
            }
            Event::LogTick => {
                service.log_interval(&mut hw, &clock, &mut log_sink);
            }
            Event::NetworkUp => {
                info!("Network up (RSSI={:?})", wifi.rssi());
                if let Err(e) = clock.start_sntp(config.ntp_server.as_str()) {
                    warn!("SNTP start failed: {}", e);
                }
            }
            Event::NetworkDown => {
                warn!("Network down; records continue while the clock holds");
            }
        });

        // Requests queued by the httpd task are answered here, between
        // samples, never during one.
        if let Some(server) = server.as_mut() {
            let metrics = RuntimeMetrics::collect(clock.uptime_secs())
                .with_loop_counters(watchdog.feeds(), server.served());
            server.poll(|req| gateway::handle(req, &mut service, &metrics, &mut log_sink));
        }

        let interval = service.config().log_interval_ms;
        if u64::from(interval) != sched.log_interval_ms() {
            sched.set_log_interval(interval);
        }

        // WiFi reconnection poll (exponential backoff).
        wifi.poll(now_ms);

        // Feed watchdog on every iteration.
        watchdog.feed();

        FreeRtos::delay_ms(LOOP_IDLE_MS);
    }
}
